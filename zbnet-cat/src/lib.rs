use colored::*;
use zbnet_frame::nwk::{NwkFrame, NwkFrameRepr};
use zbnet_frame::*;

struct Writer<'b> {
    buffer: &'b mut String,
    indent: usize,
}

impl<'b> Writer<'b> {
    fn new(buffer: &'b mut String) -> Self {
        Self { buffer, indent: 0 }
    }

    fn increase_indent(&mut self) {
        self.indent += 2;
    }

    fn decrease_indent(&mut self) {
        self.indent -= 2;
    }

    fn write(&mut self, s: String) {
        self.buffer.push_str(&" ".repeat(self.indent));
        self.buffer.push_str(&s);
    }

    fn writeln(&mut self, s: String) {
        self.write(s);
        self.buffer.push('\n');
    }
}

pub struct FrameParser {}

impl FrameParser {
    pub fn parse_hex(input: &str) -> Result<String> {
        let data = hex::decode(input).map_err(|_| Error)?;
        Self::parse(&data)
    }

    pub fn parse(input: &[u8]) -> Result<String> {
        let reader = Frame::new(input)?;
        let repr = FrameRepr::parse(&reader)?;

        let mut buffer = String::new();
        let mut w = Writer::new(&mut buffer);

        // -----------------------------------------------------------------
        // Frame Control
        // -----------------------------------------------------------------
        let fc = &repr.frame_control;
        w.writeln("Frame Control".underline().bold().to_string());
        w.increase_indent();
        w.writeln(format!(
            "{}: {}",
            "frame type".bold(),
            format!("{:?}", fc.frame_type).bright_blue(),
        ));
        w.writeln(format!(
            "{}: {}",
            "security".bold(),
            fc.security_enabled as usize
        ));
        w.writeln(format!(
            "{}: {}",
            "frame pending".bold(),
            fc.frame_pending as usize
        ));
        w.writeln(format!(
            "{}: {}",
            "ack request".bold(),
            fc.ack_request as usize
        ));
        w.writeln(format!("{}: {}", "intra-pan".bold(), fc.intra_pan as usize));
        w.writeln(format!(
            "{}: {:?}",
            "dst addressing mode".bold(),
            fc.dst_addressing_mode
        ));
        w.writeln(format!(
            "{}: {:?}",
            "src addressing mode".bold(),
            fc.src_addressing_mode
        ));
        w.decrease_indent();

        // -----------------------------------------------------------------
        // Sequence Number
        // -----------------------------------------------------------------
        w.writeln(format!("{}", "Sequence Number".underline().bold()));
        w.increase_indent();
        w.writeln(format!(
            "{}: {}",
            "sequence number".bold(),
            repr.sequence_number
        ));
        w.decrease_indent();

        // -----------------------------------------------------------------
        // Addressing
        // -----------------------------------------------------------------
        let addressing = &repr.addressing;
        if *addressing != AddressingRepr::absent() {
            w.writeln(format!("{}", "Addressing".underline().bold()));
            w.increase_indent();

            if let Some(dst_pan_id) = addressing.dst_pan_id {
                w.writeln(format!("{}: {:04x}", "dst pan id".bold(), dst_pan_id));
            }
            if addressing.dst_address != Address::Absent {
                w.writeln(format!(
                    "{}: {}{}",
                    "dst addr".bold(),
                    addressing.dst_address,
                    if addressing.dst_address.is_broadcast() {
                        " (broadcast)"
                    } else {
                        ""
                    }
                ));
            }
            if let Some(src_pan_id) = addressing.src_pan_id {
                w.writeln(format!("{}: {:04x}", "src pan id".bold(), src_pan_id));
            }
            if addressing.src_address != Address::Absent {
                w.writeln(format!(
                    "{}: {}",
                    "src addr".bold(),
                    addressing.src_address
                ));
            }
            w.decrease_indent();
        }

        // -----------------------------------------------------------------
        // Payload
        // -----------------------------------------------------------------
        match repr.payload {
            FramePayload::Ack => {}
            FramePayload::Beacon(beacon) => Self::write_beacon(&mut w, &beacon),
            FramePayload::Command(command) => Self::write_command(&mut w, &command),
            FramePayload::Data(payload) => Self::write_data(&mut w, payload),
        }

        Ok(buffer)
    }

    fn write_beacon(w: &mut Writer<'_>, beacon: &BeaconRepr) {
        w.writeln(format!("{}", "Beacon".underline().bold()));
        w.increase_indent();
        w.writeln(format!(
            "{}: {}",
            "beacon order".bold(),
            beacon.beacon_order
        ));
        w.writeln(format!(
            "{}: {}",
            "superframe order".bold(),
            beacon.superframe_order
        ));
        w.writeln(format!(
            "{}: {}",
            "final cap slot".bold(),
            beacon.final_cap_slot
        ));
        w.writeln(format!(
            "{}: {}",
            "battery life extension".bold(),
            beacon.battery_life_extension as usize
        ));
        w.writeln(format!(
            "{}: {}",
            "pan coordinator".bold(),
            beacon.pan_coordinator as usize
        ));
        w.writeln(format!(
            "{}: {}",
            "association permit".bold(),
            beacon.association_permit as usize
        ));
        w.decrease_indent();
    }

    fn write_command(w: &mut Writer<'_>, command: &MacCommandRepr) {
        w.writeln(format!("{}", "Command".underline().bold()));
        w.increase_indent();

        match command {
            MacCommandRepr::AssociationRequest { capability } => {
                w.writeln(format!("{}", "Association Request".bright_blue()));
                w.increase_indent();
                w.writeln(format!("{}: {:?}", "capability".bold(), capability));
                w.decrease_indent();
            }
            MacCommandRepr::AssociationResponse {
                short_address,
                status,
            } => {
                w.writeln(format!("{}", "Association Response".bright_blue()));
                w.increase_indent();
                w.writeln(format!(
                    "{}: {:04x}",
                    "short address".bold(),
                    short_address
                ));
                w.writeln(format!("{}: {:?}", "status".bold(), status));
                w.decrease_indent();
            }
            MacCommandRepr::DisassociationNotification { reason } => {
                w.writeln(format!("{}", "Disassociation Notification".bright_blue()));
                w.increase_indent();
                w.writeln(format!("{}: {:?}", "reason".bold(), reason));
                w.decrease_indent();
            }
            MacCommandRepr::DataRequest => {
                w.writeln(format!("{}", "Data Request".bright_blue()));
            }
            MacCommandRepr::PanIdConflictNotification => {
                w.writeln(format!("{}", "PAN ID Conflict Notification".bright_blue()));
            }
            MacCommandRepr::OrphanNotification => {
                w.writeln(format!("{}", "Orphan Notification".bright_blue()));
            }
            MacCommandRepr::BeaconRequest => {
                w.writeln(format!("{}", "Beacon Request".bright_blue()));
            }
            MacCommandRepr::CoordinatorRealignment {
                pan_id,
                coord_short_address,
                channel,
                short_address,
            } => {
                w.writeln(format!("{}", "Coordinator Realignment".bright_blue()));
                w.increase_indent();
                w.writeln(format!("{}: {:04x}", "pan id".bold(), pan_id));
                w.writeln(format!(
                    "{}: {:04x}",
                    "coord short address".bold(),
                    coord_short_address
                ));
                w.writeln(format!("{}: {}", "channel".bold(), channel));
                w.writeln(format!(
                    "{}: {:04x}",
                    "short address".bold(),
                    short_address
                ));
                w.decrease_indent();
            }
        }
        w.decrease_indent();
    }

    /// The payload of a MAC data frame on this stack is an NWK frame; fall
    /// back to a hex dump when it does not parse as one.
    fn write_data(w: &mut Writer<'_>, payload: &[u8]) {
        let nwk = match NwkFrame::new(payload) {
            Ok(reader) => NwkFrameRepr::parse(&reader),
            Err(e) => Err(e),
        };

        let Ok(nwk) = nwk else {
            w.writeln(format!("{}", "Payload".underline().bold()));
            w.increase_indent();
            w.writeln(format!("{:02x?}", payload));
            w.decrease_indent();
            return;
        };

        w.writeln(format!("{}", "NWK Header".underline().bold()));
        w.increase_indent();
        w.writeln(format!(
            "{}: {}",
            "frame type".bold(),
            format!("{:?}", nwk.frame_type).bright_blue()
        ));
        w.writeln(format!(
            "{}: {}",
            "protocol version".bold(),
            nwk::PROTOCOL_VERSION
        ));
        w.writeln(format!(
            "{}: {:?}",
            "discover route".bold(),
            nwk.discover_route
        ));
        w.writeln(format!(
            "{}: {}",
            "security".bold(),
            nwk.security_enabled as usize
        ));
        w.writeln(format!("{}: {:04x}", "dst addr".bold(), nwk.dst_address));
        w.writeln(format!("{}: {:04x}", "src addr".bold(), nwk.src_address));
        w.writeln(format!("{}: {}", "radius".bold(), nwk.radius));
        w.writeln(format!(
            "{}: {}",
            "sequence number".bold(),
            nwk.sequence_number
        ));
        w.decrease_indent();

        w.writeln(format!("{}", "NWK Payload".underline().bold()));
        w.increase_indent();
        w.writeln(format!("{:02x?}", nwk.payload));
        w.decrease_indent();
    }
}
