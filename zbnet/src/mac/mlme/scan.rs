//! Channel scanning.
//!
//! All three scan kinds share one loop: tune to a channel, optionally send a
//! soliciting command, listen for one scan-duration, move on. Beacons heard
//! anywhere feed the PAN descriptor list (duplicates suppressed); an orphan
//! scan ends early when a Coordinator Realignment arrives.

use rand_core::RngCore;

use crate::frame::{Address, BeaconRepr, FrameBuilder, FrameRepr, MacCommandRepr};
use crate::mac::constants::*;
use crate::mac::state::MacState;
use crate::mac::timer::DelayTimer;
use crate::mac::{Mac, MacUpper, PanDescriptor, ScanContext, ScanKind, Status};
use crate::phy::{Radio, RadioState};

impl<'p, R, T, Rng> Mac<'p, R, T, Rng>
where
    R: Radio,
    T: DelayTimer,
    Rng: RngCore,
{
    /// Scan a channel range.
    ///
    /// The scan duration per channel is `BASE_SUPERFRAME_DURATION *
    /// (2^duration_order + 1)` symbols. Completion arrives as
    /// [`MacUpper::ScanConfirm`]; an orphan scan that gets realigned
    /// confirms early with the device back in `Associated`.
    pub fn mlme_scan_request(
        &mut self,
        kind: ScanKind,
        first_channel: u8,
        last_channel: u8,
        duration_order: u8,
    ) -> bool {
        if !self.state.is_operational() {
            return false;
        }
        if !(FIRST_CHANNEL..=LAST_CHANNEL).contains(&first_channel)
            || !(FIRST_CHANNEL..=LAST_CHANNEL).contains(&last_channel)
            || first_channel > last_channel
            || duration_order > 14
        {
            return false;
        }

        self.prior = self.state;
        self.state = MacState::BusyScanning;
        self.scan = Some(ScanContext {
            kind,
            current: first_channel,
            last: last_channel,
            duration_order,
            descriptors: heapless::Vec::new(),
        });

        // Accept beacons from any PAN while scanning.
        self.radio.set_pan_id(BROADCAST_PAN_ID);
        self.begin_channel();
        true
    }

    /// Tune to the scan's current channel and solicit where the kind asks
    /// for it.
    fn begin_channel(&mut self) {
        let Some((kind, channel, duration_order)) = self
            .scan
            .as_ref()
            .map(|scan| (scan.kind, scan.current, scan.duration_order))
        else {
            return;
        };

        self.radio.set_channel(channel);
        self.radio.set_state(RadioState::Rx);

        let solicit = match kind {
            ScanKind::Active => Some(MacCommandRepr::BeaconRequest),
            ScanKind::Orphan => Some(MacCommandRepr::OrphanNotification),
            ScanKind::Passive => None,
        };

        if let Some(command) = solicit {
            let sequence_number = self.next_sequence_number();
            let mut builder = FrameBuilder::new_command(command)
                .set_sequence_number(sequence_number)
                .set_dst_pan_id(BROADCAST_PAN_ID)
                .set_dst_address(Address::BROADCAST);

            // An Orphan Notification identifies the orphan by its extended
            // address; a Beacon Request is anonymous.
            if kind == ScanKind::Orphan {
                builder = builder
                    .set_src_pan_id(BROADCAST_PAN_ID)
                    .set_src_address(Address::Extended(self.pib.extended_address));
            }

            if let Ok(frame) = builder.finalize() {
                if !self.transmit_frame(&frame) {
                    warn!("scan solicitation refused by radio");
                }
                self.radio.set_state(RadioState::Rx);
            }
        }

        self.timer.start(scan_duration(duration_order));
    }

    /// The dwell on the current channel elapsed: step or finish.
    pub(crate) fn continue_scan(&mut self) -> Option<MacUpper<'p>> {
        let done = match self.scan.as_mut() {
            Some(scan) if scan.current < scan.last => {
                scan.current += 1;
                false
            }
            Some(_) => true,
            None => return None,
        };

        if !done {
            self.begin_channel();
            return None;
        }

        let scan = self.scan.take()?;
        self.end_scan();

        let status = if scan.kind == ScanKind::Orphan || scan.descriptors.is_empty() {
            // An orphan scan that ran to completion never got realigned.
            Status::NoBeacon
        } else {
            Status::Success
        };

        Some(MacUpper::ScanConfirm {
            status,
            kind: scan.kind,
            descriptors: scan.descriptors,
        })
    }

    /// Restore the radio and state after a scan.
    fn end_scan(&mut self) {
        self.timer.cancel();
        self.radio.set_pan_id(self.pib.pan_id);
        self.radio.set_channel(self.pib.channel);
        self.state = self.prior;
        self.radio_idle();
    }

    /// A beacon arrived: always a beacon notification, and a PAN descriptor
    /// while scanning.
    pub(crate) fn handle_beacon(
        &mut self,
        beacon: &BeaconRepr,
        repr: &FrameRepr<'_>,
        lqi: u8,
    ) -> Option<MacUpper<'p>> {
        let Some(pan_id) = repr.addressing.src_pan_id else {
            return None;
        };

        let descriptor = PanDescriptor {
            coord_address: repr.addressing.src_address,
            pan_id,
            channel: self
                .scan
                .as_ref()
                .map(|scan| scan.current)
                .unwrap_or(self.pib.channel),
            pan_coordinator: beacon.pan_coordinator,
            association_permit: beacon.association_permit,
            lqi,
        };

        if let Some(scan) = self.scan.as_mut() {
            let duplicate = scan.descriptors.iter().any(|d| {
                d.pan_id == descriptor.pan_id
                    && d.coord_address == descriptor.coord_address
                    && d.channel == descriptor.channel
            });
            if !duplicate && scan.descriptors.push(descriptor).is_err() {
                debug!("PAN descriptor list full");
            }
        }

        Some(MacUpper::BeaconNotify { descriptor })
    }

    /// An orphaned device announced itself (coordinator side). The layer
    /// above answers with [`mlme_orphan_response`] if it knows the device.
    ///
    /// [`mlme_orphan_response`]: Mac::mlme_orphan_response
    pub(crate) fn handle_orphan_notification(
        &mut self,
        repr: &FrameRepr<'_>,
    ) -> Option<MacUpper<'p>> {
        if self.state != MacState::Started {
            return None;
        }
        let Address::Extended(device) = repr.addressing.src_address else {
            return None;
        };
        Some(MacUpper::OrphanIndication { device })
    }

    /// Send a Coordinator Realignment to a known orphaned device.
    pub fn mlme_orphan_response(&mut self, device: [u8; 8], short_address: u16) -> bool {
        if self.state != MacState::Started {
            return false;
        }

        let sequence_number = self.next_sequence_number();
        let Ok(frame) = FrameBuilder::new_command(MacCommandRepr::CoordinatorRealignment {
            pan_id: self.pib.pan_id,
            coord_short_address: self.pib.short_address,
            channel: self.pib.channel,
            short_address,
        })
        .set_sequence_number(sequence_number)
        .set_dst_pan_id(BROADCAST_PAN_ID)
        .set_dst_address(Address::Extended(device))
        .set_src_pan_id(self.pib.pan_id)
        .set_src_address(Address::short(self.pib.short_address))
        .finalize() else {
            return false;
        };

        self.transmit_frame(&frame)
    }

    /// A Coordinator Realignment arrived while orphan-scanning: rejoin the
    /// PAN it describes.
    pub(crate) fn handle_realignment(
        &mut self,
        pan_id: u16,
        coord_short_address: u16,
        channel: u8,
        short_address: u16,
    ) -> Option<MacUpper<'p>> {
        let orphan_scanning = matches!(
            self.scan.as_ref(),
            Some(scan) if scan.kind == ScanKind::Orphan
        );
        if self.state != MacState::BusyScanning || !orphan_scanning {
            return None;
        }

        let kind = self.scan.take().map(|scan| scan.kind)?;

        self.pib.pan_id = pan_id;
        self.pib.coord_short_address = coord_short_address;
        self.pib.channel = channel;
        self.pib.short_address = short_address;

        // `end_scan` programs the radio from the PIB fields set above.
        self.end_scan();
        self.radio.set_short_address(short_address);

        self.state = MacState::Associated;
        self.prior = MacState::Associated;
        info!("realigned onto channel {}", channel);

        Some(MacUpper::ScanConfirm {
            status: Status::Success,
            kind,
            descriptors: heapless::Vec::new(),
        })
    }
}
