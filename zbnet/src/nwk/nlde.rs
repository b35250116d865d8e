//! NLDE data transfer: sending, local delivery and relaying.

use rand_core::RngCore;

use crate::frame::nwk::{
    DiscoverRoute, NwkFrame, NwkFrameRepr, NwkFrameType, BROADCAST_ADDRESS, HEADER_LEN,
};
use crate::frame::{Address, AddressingMode};
use crate::mac::timer::DelayTimer;
use crate::mac::DataIndication;
use crate::phy::Radio;

use super::address::next_hop;
use super::nib::NetworkState;
use super::{Nwk, NwkUpper};

impl<'p, R, T, Rng> Nwk<'p, R, T, Rng>
where
    R: Radio,
    T: DelayTimer,
    Rng: RngCore,
{
    /// Send a data frame to a short address on the network.
    ///
    /// The NWK header and payload go into a freshly allocated pool buffer,
    /// which is freed again when this returns; the radio has its own copy
    /// by then. `radius` defaults to twice the maximum tree depth.
    /// Completion arrives as [`NwkUpper::DataConfirm`].
    pub fn nlde_data_request(
        &mut self,
        dst_address: u16,
        payload: &[u8],
        radius: Option<u8>,
    ) -> bool {
        if !matches!(
            self.nib.state,
            NetworkState::Joined | NetworkState::Formed | NetworkState::Started
        ) {
            return false;
        }

        let repr = NwkFrameRepr {
            frame_type: NwkFrameType::Data,
            discover_route: DiscoverRoute::Suppress,
            security_enabled: false,
            dst_address,
            src_address: self.nib.short_address,
            radius: radius.unwrap_or(2 * self.nib.tree.max_depth),
            sequence_number: self.nib.next_sequence_number(),
            payload,
        };

        let pool = self.mac.pool;
        let Some(mut buffer) = pool.alloc(repr.buffer_len()) else {
            warn!("pool exhausted, cannot send");
            return false;
        };
        repr.emit(&mut NwkFrame::new_unchecked(&mut buffer[..]));

        self.route_and_send(dst_address, &buffer)
    }

    /// Hand an NWK frame to the MAC, addressed to the next hop toward
    /// `dst_address`.
    fn route_and_send(&mut self, dst_address: u16, frame: &[u8]) -> bool {
        let (mac_dst, ack_request) = if dst_address == BROADCAST_ADDRESS {
            (Address::BROADCAST, false)
        } else {
            let hop = next_hop(
                &self.nib.tree,
                self.nib.short_address,
                self.nib.depth,
                dst_address,
            )
            .unwrap_or(self.nib.parent);
            (Address::short(hop), true)
        };

        self.mac.mcps_data_request(
            self.nib.pan_id,
            mac_dst,
            AddressingMode::Short,
            frame,
            ack_request,
        )
    }

    /// A MAC data indication arrived: deliver it locally or relay it.
    ///
    /// The pool buffer travels with the frame on every path and is freed
    /// exactly once: shifted into a pure-payload buffer for local delivery,
    /// or dropped here after the relay handed its copy to the radio.
    pub(crate) fn handle_data_indication(
        &mut self,
        indication: DataIndication<'p>,
    ) -> Option<NwkUpper<'p>> {
        let mut payload = indication.payload;

        let (dst_address, src_address, radius, sequence_number) = {
            let Ok(reader) = NwkFrame::new(&payload[..]) else {
                debug!("dropping short NWK frame");
                return None;
            };
            let Ok(repr) = NwkFrameRepr::parse(&reader) else {
                debug!("dropping invalid NWK frame");
                return None;
            };
            (
                repr.dst_address,
                repr.src_address,
                repr.radius,
                repr.sequence_number,
            )
        };

        if dst_address == self.nib.short_address || dst_address == BROADCAST_ADDRESS {
            // Strip the header in place and pass the buffer up.
            let len = payload.len();
            payload.copy_within(HEADER_LEN.., 0);
            payload.truncate(len - HEADER_LEN);

            return Some(NwkUpper::DataIndication {
                src_address,
                dst_address,
                payload,
                lqi: indication.lqi,
            });
        }

        if !self.nib.is_relay() {
            // An end device never forwards.
            return None;
        }

        if radius <= 1 {
            debug!("radius exhausted, dropping relay");
            return None;
        }

        // Forward: one radius tick down, one sequence tick up, same payload.
        {
            let mut frame = NwkFrame::new_unchecked(&mut payload[..]);
            frame.set_radius(radius - 1);
            frame.set_sequence_number(sequence_number.wrapping_add(1));
        }

        if !self.route_and_send(dst_address, &payload) {
            debug!("relay refused by MAC");
        }
        None
    }
}
