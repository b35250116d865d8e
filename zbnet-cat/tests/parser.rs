use zbnet_cat::FrameParser;

use strip_ansi_escapes::strip;

#[test]
fn association_request() {
    let input = "23884234120000ffff0200018e";
    let output = String::from_utf8(strip(FrameParser::parse_hex(input).unwrap())).unwrap();
    assert_eq!(
        output,
        "Frame Control
  frame type: MacCommand
  security: 0
  frame pending: 0
  ack request: 1
  intra-pan: 0
  dst addressing mode: Short
  src addressing mode: Short
Sequence Number
  sequence number: 66
Addressing
  dst pan id: 1234
  dst addr: 00:00
  src pan id: ffff
  src addr: 02:00
Command
  Association Request
    capability: CapabilityInformation(FULL_FUNCTION_DEVICE | MAINS_POWERED | RX_ON_WHEN_IDLE | ALLOCATE_ADDRESS)
"
    );
}

#[test]
fn data_frame_with_nwk_header() {
    let input = "618807341200000100080000003014092aaabbcc";
    let output = String::from_utf8(strip(FrameParser::parse_hex(input).unwrap())).unwrap();
    assert_eq!(
        output,
        "Frame Control
  frame type: Data
  security: 0
  frame pending: 0
  ack request: 1
  intra-pan: 1
  dst addressing mode: Short
  src addressing mode: Short
Sequence Number
  sequence number: 7
Addressing
  dst pan id: 1234
  dst addr: 00:00
  src addr: 01:00
NWK Header
  frame type: Data
  protocol version: 2
  discover route: Suppress
  security: 0
  dst addr: 0000
  src addr: 1430
  radius: 9
  sequence number: 42
NWK Payload
  [aa, bb, cc]
"
    );
}

#[test]
fn beacon() {
    let input = "00801134120100ffcf0000";
    let output = String::from_utf8(strip(FrameParser::parse_hex(input).unwrap())).unwrap();
    assert_eq!(
        output,
        "Frame Control
  frame type: Beacon
  security: 0
  frame pending: 0
  ack request: 0
  intra-pan: 0
  dst addressing mode: Absent
  src addressing mode: Short
Sequence Number
  sequence number: 17
Addressing
  src pan id: 1234
  src addr: 01:00
Beacon
  beacon order: 15
  superframe order: 15
  final cap slot: 15
  battery life extension: 0
  pan coordinator: 1
  association permit: 1
"
    );
}

#[test]
fn garbage_is_rejected() {
    assert!(FrameParser::parse_hex("zz").is_err());
    assert!(FrameParser::parse_hex("61").is_err());
}
