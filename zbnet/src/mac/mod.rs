//! The IEEE 802.15.4 MAC sublayer.
//!
//! [`Mac`] is a sans-io state machine: platform glue posts [`MacEvent`]s to
//! the kernel queue from interrupt context, the superloop feeds them to
//! [`Mac::process`], and every upward notification comes back as a
//! [`MacUpper`] return value. Request primitives (`mlme_*`, `mcps_*`) are
//! plain method calls, validated against the current [`MacState`] before any
//! I/O happens; the asynchronous ones complete through `process`.
//!
//! The PAN is beaconless (beacon order 15): beacons are only ever sent in
//! reply to a Beacon Request during an active scan.

pub mod constants;
pub mod mcps;
pub mod mlme;
pub mod pib;
pub mod state;
pub mod timer;

use rand_core::RngCore;

use crate::frame::{
    Address, BeaconRepr, CapabilityInformation, DisassociationReason, Frame, FramePayload,
    FrameRepr, MacCommandRepr, MAX_FRAME_LEN,
};
use crate::phy::{Radio, RadioState, TxStatus};
use crate::pool::{Buffer, BufferPool};

use constants::*;
use pib::Pib;
use state::MacState;
use timer::DelayTimer;

/// The status of a completed MAC exchange.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Status {
    Success,
    /// The radio reported a busy channel.
    ChannelAccessFailure,
    /// No acknowledgment arrived within the acknowledgment wait.
    NoAck,
    /// The poll was acknowledged but no response frame followed.
    NoData,
    /// The coordinator refused the association.
    Denied,
    /// The coordinator has no address left to assign.
    AtCapacity,
    /// The scan finished without hearing a beacon or realignment.
    NoBeacon,
}

/// An event posted to the kernel queue for the MAC to process.
///
/// The first two are posted by the radio driver's interrupt handlers, the
/// third by the delay-timer interrupt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum MacEvent {
    /// The transmission handed to [`Radio::transmit`] completed.
    TxDone(TxStatus),
    /// A frame passed the radio's filters and is ready to [`Radio::read`].
    FrameReceived,
    /// The [`DelayTimer`] slot expired.
    TimerExpired,
}

/// The kind of channel scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ScanKind {
    /// Solicit beacons with a Beacon Request on every channel.
    Active,
    /// Listen for unsolicited beacons.
    Passive,
    /// Solicit a Coordinator Realignment with an Orphan Notification.
    Orphan,
}

/// A PAN heard during a scan, or the origin of a received beacon.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PanDescriptor {
    pub coord_address: Address,
    pub pan_id: u16,
    pub channel: u8,
    pub pan_coordinator: bool,
    pub association_permit: bool,
    pub lqi: u8,
}

/// A received data frame, delivered with its pool buffer.
#[derive(Debug)]
pub struct DataIndication<'p> {
    pub src_pan_id: u16,
    pub src_address: Address,
    pub dst_address: Address,
    pub payload: Buffer<'p>,
    pub lqi: u8,
}

/// A notification from the MAC to the layer above.
#[derive(Debug)]
pub enum MacUpper<'p> {
    AssociateConfirm {
        status: Status,
        short_address: u16,
    },
    AssociateIndication {
        device: [u8; 8],
        capability: CapabilityInformation,
    },
    /// Completion of an [`mlme_associate_response`] exchange.
    ///
    /// [`mlme_associate_response`]: Mac::mlme_associate_response
    CommStatus {
        status: Status,
        device: [u8; 8],
    },
    DisassociateConfirm {
        status: Status,
    },
    DisassociateIndication {
        device: Address,
        reason: DisassociationReason,
    },
    BeaconNotify {
        descriptor: PanDescriptor,
    },
    ScanConfirm {
        status: Status,
        kind: ScanKind,
        descriptors: heapless::Vec<PanDescriptor, MAX_PAN_DESCRIPTORS>,
    },
    DataConfirm {
        status: Status,
    },
    DataIndication(DataIndication<'p>),
    OrphanIndication {
        device: [u8; 8],
    },
}

/// The progress of a channel scan.
pub(crate) struct ScanContext {
    pub(crate) kind: ScanKind,
    pub(crate) current: u8,
    pub(crate) last: u8,
    pub(crate) duration_order: u8,
    pub(crate) descriptors: heapless::Vec<PanDescriptor, MAX_PAN_DESCRIPTORS>,
}

/// An Association Response parked until the device polls for it.
pub(crate) struct IndirectResponse<'p> {
    pub(crate) frame: Buffer<'p>,
    pub(crate) device: [u8; 8],
    pub(crate) sequence_number: u8,
}

/// The MAC sublayer context.
pub struct Mac<'p, R: Radio, T: DelayTimer, Rng: RngCore> {
    pub(crate) radio: R,
    pub(crate) timer: T,
    pub(crate) rng: Rng,
    pub(crate) pool: &'p BufferPool,
    pub(crate) pib: Pib,
    pub(crate) state: MacState,
    /// The operational state to restore when the current exchange completes.
    pub(crate) prior: MacState,
    /// The data sequence number for the next outgoing frame.
    pub(crate) dsn: u8,
    /// The sequence number of the acknowledgment currently awaited.
    pub(crate) ack_seq: u8,
    /// An unacknowledged data transmission is in flight; its `TxDone`
    /// becomes the data confirm.
    pub(crate) unacked_data: bool,
    pub(crate) scan: Option<ScanContext>,
    pub(crate) indirect: Option<IndirectResponse<'p>>,
}

impl<'p, R, T, Rng> Mac<'p, R, T, Rng>
where
    R: Radio,
    T: DelayTimer,
    Rng: RngCore,
{
    /// Create an uninitialized MAC; [`mlme_reset_request`] brings it up.
    ///
    /// [`mlme_reset_request`]: Mac::mlme_reset_request
    pub fn new(radio: R, timer: T, pool: &'p BufferPool, rng: Rng) -> Self {
        Self {
            radio,
            timer,
            rng,
            pool,
            pib: Pib::default(),
            state: MacState::Uninitialized,
            prior: MacState::Idle,
            dsn: 0,
            ack_seq: 0,
            unacked_data: false,
            scan: None,
            indirect: None,
        }
    }

    /// The current MAC state.
    pub fn state(&self) -> MacState {
        self.state
    }

    /// The PAN identifier currently in use.
    pub fn pan_id(&self) -> u16 {
        self.pib.pan_id
    }

    /// The short address currently in use.
    pub fn short_address(&self) -> u16 {
        self.pib.short_address
    }

    /// The extended address of the device.
    pub fn extended_address(&self) -> [u8; 8] {
        self.pib.extended_address
    }

    /// Feed one event through the state machine.
    pub fn process(&mut self, event: MacEvent) -> Option<MacUpper<'p>> {
        match event {
            MacEvent::TxDone(status) => self.handle_tx_done(status),
            MacEvent::FrameReceived => self.handle_frame_received(),
            MacEvent::TimerExpired => self.handle_timer_expired(),
        }
    }

    pub(crate) fn next_sequence_number(&mut self) -> u8 {
        let sequence_number = self.dsn;
        self.dsn = self.dsn.wrapping_add(1);
        sequence_number
    }

    /// Emit `repr` into a stack buffer and hand it to the radio.
    pub(crate) fn transmit_frame(&mut self, repr: &FrameRepr<'_>) -> bool {
        let len = repr.buffer_len();
        if len > MAX_FRAME_LEN {
            return false;
        }

        let mut buffer = [0u8; MAX_FRAME_LEN];
        {
            let mut frame = Frame::new_unchecked(&mut buffer[..len]);
            repr.emit(&mut frame);
        }

        self.radio.set_state(RadioState::Tx);
        self.radio.transmit(&buffer[..len])
    }

    /// Put the radio back in its idle listening state.
    pub(crate) fn radio_idle(&mut self) {
        if self.pib.rx_on_when_idle {
            self.radio.set_state(RadioState::Rx);
        } else {
            self.radio.set_state(RadioState::Sleep);
        }
    }

    /// Restore the operational state saved before the current exchange.
    pub(crate) fn restore_prior(&mut self) {
        self.state = self.prior;
        self.radio_idle();
    }

    fn handle_tx_done(&mut self, status: TxStatus) -> Option<MacUpper<'p>> {
        match status {
            TxStatus::Success => match self.state {
                MacState::TxWaitingAck
                | MacState::WaitingAssociationRequestAck
                | MacState::WaitingDataRequestAck
                | MacState::WaitingAssociationResponseAck
                | MacState::WaitingDisassociationAck => {
                    // The frame left the antenna; bound the acknowledgment
                    // wait.
                    self.radio.set_state(RadioState::Rx);
                    self.timer.start(ACK_WAIT_DURATION);
                    None
                }
                MacState::BusyScanning => {
                    // Back to listening for the rest of the scan window.
                    self.radio.set_state(RadioState::Rx);
                    None
                }
                _ if self.unacked_data => {
                    self.unacked_data = false;
                    self.radio_idle();
                    Some(MacUpper::DataConfirm {
                        status: Status::Success,
                    })
                }
                _ => {
                    // An unacknowledged transmission (a beacon, a
                    // realignment) finished.
                    self.radio_idle();
                    None
                }
            },
            TxStatus::ChannelAccessFailure => self.fail_exchange(Status::ChannelAccessFailure),
        }
    }

    fn handle_timer_expired(&mut self) -> Option<MacUpper<'p>> {
        match self.state {
            MacState::BusyScanning => self.continue_scan(),
            MacState::WaitingResponseWindow => self.send_data_request_poll(),
            MacState::WaitingAssociationResponse => self.fail_exchange(Status::NoData),
            MacState::TxWaitingAck
            | MacState::WaitingAssociationRequestAck
            | MacState::WaitingDataRequestAck
            | MacState::WaitingAssociationResponseAck
            | MacState::WaitingDisassociationAck => self.fail_exchange(Status::NoAck),
            _ => None,
        }
    }

    /// Abort the exchange the MAC is blocked on and report `status` through
    /// the matching confirm.
    fn fail_exchange(&mut self, status: Status) -> Option<MacUpper<'p>> {
        self.timer.cancel();

        match self.state {
            MacState::TxWaitingAck => {
                self.restore_prior();
                Some(MacUpper::DataConfirm { status })
            }
            MacState::WaitingAssociationRequestAck
            | MacState::WaitingResponseWindow
            | MacState::WaitingDataRequestAck
            | MacState::WaitingAssociationResponse => self.fail_association(status),
            MacState::WaitingAssociationResponseAck => {
                self.restore_prior();
                // Dropping the slot returns its buffer to the pool.
                let device = self.indirect.take().map(|i| i.device).unwrap_or([0; 8]);
                Some(MacUpper::CommStatus { status, device })
            }
            MacState::WaitingDisassociationAck => {
                self.finish_disassociation();
                Some(MacUpper::DisassociateConfirm { status })
            }
            _ if self.unacked_data => {
                self.unacked_data = false;
                self.radio_idle();
                Some(MacUpper::DataConfirm { status })
            }
            _ => None,
        }
    }

    fn handle_frame_received(&mut self) -> Option<MacUpper<'p>> {
        let mut buffer = [0u8; MAX_FRAME_LEN];
        let len = self.radio.read(&mut buffer);
        if len == 0 {
            return None;
        }
        let lqi = self.radio.last_lqi();

        let reader = match Frame::new(&buffer[..len]) {
            Ok(reader) => reader,
            Err(_) => {
                warn!("dropping malformed frame");
                return None;
            }
        };
        let repr = match FrameRepr::parse(&reader) {
            Ok(repr) => repr,
            Err(_) => {
                warn!("dropping unparseable frame");
                return None;
            }
        };

        match repr.payload {
            FramePayload::Ack => {
                if self.awaiting_ack() && repr.sequence_number == self.ack_seq {
                    self.handle_ack()
                } else {
                    None
                }
            }
            FramePayload::Beacon(beacon) => self.handle_beacon(&beacon, &repr, lqi),
            FramePayload::Data(payload) => {
                if !self.frame_for_us(&repr) {
                    return None;
                }
                self.deliver_data(&repr, payload, lqi)
            }
            FramePayload::Command(command) => {
                if !self.frame_for_us(&repr) {
                    return None;
                }
                self.handle_command(&command, &repr)
            }
        }
    }

    fn awaiting_ack(&self) -> bool {
        matches!(
            self.state,
            MacState::TxWaitingAck
                | MacState::WaitingAssociationRequestAck
                | MacState::WaitingDataRequestAck
                | MacState::WaitingAssociationResponseAck
                | MacState::WaitingDisassociationAck
        )
    }

    /// The acknowledgment the current exchange was waiting on arrived.
    fn handle_ack(&mut self) -> Option<MacUpper<'p>> {
        self.timer.cancel();

        match self.state {
            MacState::TxWaitingAck => {
                self.restore_prior();
                Some(MacUpper::DataConfirm {
                    status: Status::Success,
                })
            }
            MacState::WaitingAssociationRequestAck => {
                // Wait out the response window, then poll the coordinator.
                self.state = MacState::WaitingResponseWindow;
                self.timer.start(RESPONSE_WAIT_TIME);
                None
            }
            MacState::WaitingDataRequestAck => {
                self.state = MacState::WaitingAssociationResponse;
                self.timer.start(RESPONSE_WAIT_TIME);
                None
            }
            MacState::WaitingAssociationResponseAck => {
                self.restore_prior();
                let device = self.indirect.take().map(|i| i.device).unwrap_or([0; 8]);
                Some(MacUpper::CommStatus {
                    status: Status::Success,
                    device,
                })
            }
            MacState::WaitingDisassociationAck => {
                self.finish_disassociation();
                Some(MacUpper::DisassociateConfirm {
                    status: Status::Success,
                })
            }
            _ => None,
        }
    }

    /// Whether a received frame is addressed to this device.
    fn frame_for_us(&self, repr: &FrameRepr<'_>) -> bool {
        if let Some(pan) = repr.addressing.dst_pan_id {
            if pan != BROADCAST_PAN_ID && self.pib.pan_id != BROADCAST_PAN_ID && pan != self.pib.pan_id
            {
                return false;
            }
        }

        match repr.addressing.dst_address {
            Address::Absent => true,
            Address::Short(bytes) => {
                let short = u16::from_le_bytes(bytes);
                short == BROADCAST_SHORT_ADDRESS || short == self.pib.short_address
            }
            Address::Extended(bytes) => bytes == self.pib.extended_address,
        }
    }

    fn deliver_data(
        &mut self,
        repr: &FrameRepr<'_>,
        payload: &[u8],
        lqi: u8,
    ) -> Option<MacUpper<'p>> {
        let Some(mut buffer) = self.pool.alloc(payload.len()) else {
            warn!("rx pool exhausted, dropping data frame");
            return None;
        };
        buffer.copy_from_slice(payload);

        Some(MacUpper::DataIndication(DataIndication {
            src_pan_id: repr
                .addressing
                .src_pan_id
                .or(repr.addressing.dst_pan_id)
                .unwrap_or(BROADCAST_PAN_ID),
            src_address: repr.addressing.src_address,
            dst_address: repr.addressing.dst_address,
            payload: buffer,
            lqi,
        }))
    }

    fn handle_command(
        &mut self,
        command: &MacCommandRepr,
        repr: &FrameRepr<'_>,
    ) -> Option<MacUpper<'p>> {
        match command {
            MacCommandRepr::AssociationRequest { capability } => {
                self.handle_association_request(*capability, repr)
            }
            MacCommandRepr::AssociationResponse {
                short_address,
                status,
            } => self.handle_association_response(*short_address, *status),
            MacCommandRepr::DataRequest => self.handle_data_request_poll(repr),
            MacCommandRepr::DisassociationNotification { reason } => {
                self.handle_disassociation_notification(*reason, repr)
            }
            MacCommandRepr::BeaconRequest => self.handle_beacon_request(),
            MacCommandRepr::OrphanNotification => self.handle_orphan_notification(repr),
            MacCommandRepr::CoordinatorRealignment {
                pan_id,
                coord_short_address,
                channel,
                short_address,
            } => self.handle_realignment(*pan_id, *coord_short_address, *channel, *short_address),
            MacCommandRepr::PanIdConflictNotification => None,
        }
    }

    /// A coordinator answers Beacon Requests with a contention-free-less
    /// beacon describing the PAN.
    fn handle_beacon_request(&mut self) -> Option<MacUpper<'p>> {
        if self.state != MacState::Started {
            return None;
        }

        let beacon = BeaconRepr {
            beacon_order: 15,
            superframe_order: 15,
            final_cap_slot: 15,
            battery_life_extension: false,
            pan_coordinator: true,
            association_permit: self.pib.association_permit,
        };

        let sequence_number = self.next_sequence_number();
        let Ok(frame) = crate::frame::FrameBuilder::new_beacon(beacon)
            .set_sequence_number(sequence_number)
            .set_src_pan_id(self.pib.pan_id)
            .set_src_address(Address::short(self.pib.short_address))
            .finalize()
        else {
            return None;
        };

        if !self.transmit_frame(&frame) {
            warn!("beacon transmission refused by radio");
        }
        None
    }
}

#[cfg(test)]
mod tests;
