/// The explicit state of the MAC sublayer.
///
/// Every primitive and every event handler is gated on this state; a request
/// arriving in the wrong state is rejected before any I/O happens. The
/// `Waiting*` states describe exactly which frame or timeout the MAC is
/// blocked on, so a stray acknowledgment or an expired timer can never be
/// attributed to the wrong exchange.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum MacState {
    /// No reset has been performed yet.
    Uninitialized,
    /// Reset and idle, not part of any PAN.
    Idle,
    /// Associated to a PAN as a device.
    Associated,
    /// Operating as the coordinator of a PAN.
    Started,
    /// A channel scan is in progress.
    BusyScanning,
    /// A data frame with acknowledgment request is in the air.
    TxWaitingAck,
    /// An Association Request is in the air.
    WaitingAssociationRequestAck,
    /// The Association Request was acknowledged; waiting out the response
    /// window before polling the coordinator.
    WaitingResponseWindow,
    /// The Data Request poll is in the air.
    WaitingDataRequestAck,
    /// The poll was acknowledged; waiting for the Association Response.
    WaitingAssociationResponse,
    /// Coordinator only: the Association Response is in the air.
    WaitingAssociationResponseAck,
    /// A Disassociation Notification is in the air.
    WaitingDisassociationAck,
}

impl MacState {
    /// Whether the MAC is between exchanges and may accept a new request.
    pub fn is_operational(&self) -> bool {
        matches!(
            self,
            MacState::Idle | MacState::Associated | MacState::Started
        )
    }
}
