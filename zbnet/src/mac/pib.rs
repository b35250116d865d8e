use super::constants::*;

/// PAN Information Base (PIB) maintained by the MAC sublayer.
pub struct Pib {
    /// The extended address assigned to the device.
    pub(crate) extended_address: [u8; 8],
    /// The address the device uses to communicate in the PAN. Allocated by
    /// the coordinator during association, or chosen before starting a PAN.
    pub(crate) short_address: u16,
    /// The identifier of the PAN on which the device is operating. A value of
    /// 0xffff means the device is not associated.
    pub(crate) pan_id: u16,
    /// The channel the radio is tuned to.
    pub(crate) channel: u8,
    /// Indication of whether a coordinator is currently allowing association.
    pub(crate) association_permit: bool,
    /// The short address of the coordinator through which the device is
    /// associated. A value of 0xfffe indicates the coordinator only uses its
    /// extended address; 0xffff indicates the value is unknown.
    pub(crate) coord_short_address: u16,
    /// The extended address of the coordinator through which the device is
    /// associated.
    pub(crate) coord_extended_address: Option<[u8; 8]>,
    /// Indication of whether the receiver stays enabled during idle periods.
    pub(crate) rx_on_when_idle: bool,
}

impl Default for Pib {
    fn default() -> Self {
        Self {
            extended_address: [0; 8],
            short_address: BROADCAST_SHORT_ADDRESS,
            pan_id: BROADCAST_PAN_ID,
            channel: FIRST_CHANNEL,
            association_permit: false,
            coord_short_address: BROADCAST_SHORT_ADDRESS,
            coord_extended_address: None,
            rx_on_when_idle: true,
        }
    }
}
