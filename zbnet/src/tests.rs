//! A three-node network exercised end to end: a coordinator forms a PAN, a
//! router joins and starts, an end device joins the router, and a data frame
//! travels from the leaf to the root through one relay hop.
//!
//! The air interface is played by hand: every transmitted frame is popped
//! off one test radio and injected into the other, with the acknowledgments
//! the hardware would generate supplied by the test.

use crate::frame::nwk::{NwkFrame, NwkFrameRepr};
use crate::frame::{Address, Frame, FrameBuilder, FramePayload, FrameRepr};
use crate::mac::timer::tests::TestTimer;
use crate::mac::{Mac, MacEvent, Status};
use crate::nwk::nib::TreeConfig;
use crate::nwk::{Nwk, NwkUpper};
use crate::phy::tests::TestRadio;
use crate::phy::TxStatus;
use crate::pool::BufferPool;

use rand::rngs::mock::StepRng;

use std::vec::Vec;

const PAN: u16 = 0x1234;
const CHANNEL: u8 = 15;

type TestNwk<'p> = Nwk<'p, TestRadio, TestTimer, StepRng>;

fn pool() -> BufferPool {
    BufferPool::new(&[(32, 8), (128, 8)]).unwrap()
}

fn node(pool: &BufferPool, id: u8) -> TestNwk<'_> {
    let mut mac = Mac::new(
        TestRadio::new(),
        TestTimer::new(),
        pool,
        StepRng::new(id as u64, 1),
    );
    mac.set_extended_address([id, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, id]);
    Nwk::new(mac, TreeConfig::default())
}

fn ack(sequence_number: u8) -> Vec<u8> {
    let repr = FrameBuilder::new_ack(sequence_number).finalize().unwrap();
    let mut buffer = std::vec![0u8; repr.buffer_len()];
    repr.emit(&mut Frame::new_unchecked(&mut buffer[..]));
    buffer
}

fn seq_of(bytes: &[u8]) -> u8 {
    FrameRepr::parse(&Frame::new(bytes).unwrap())
        .unwrap()
        .sequence_number
}

/// Put `bytes` on a node's antenna and let it process the reception.
fn deliver<'p>(node: &mut TestNwk<'p>, bytes: &[u8]) -> Option<NwkUpper<'p>> {
    node.mac.radio.inject(bytes);
    node.process(MacEvent::FrameReceived)
}

/// One MAC hop of an NWK data frame, taken apart for assertions.
struct Hop {
    mac_dst: Address,
    mac_src: Address,
    dst: u16,
    src: u16,
    radius: u8,
    seq: u8,
    payload: Vec<u8>,
}

fn data_hop(bytes: &[u8]) -> Hop {
    let reader = Frame::new(bytes).unwrap();
    let repr = FrameRepr::parse(&reader).unwrap();
    let FramePayload::Data(payload) = repr.payload else {
        panic!("expected a data frame");
    };
    let nwk = NwkFrame::new(payload).unwrap();
    let nwk = NwkFrameRepr::parse(&nwk).unwrap();

    Hop {
        mac_dst: repr.addressing.dst_address,
        mac_src: repr.addressing.src_address,
        dst: nwk.dst_address,
        src: nwk.src_address,
        radius: nwk.radius,
        seq: nwk.sequence_number,
        payload: Vec::from(nwk.payload),
    }
}

/// Run an active scan on `seeker` with `responder` answering the beacon
/// request, and return the address the beacon advertised.
fn discover(seeker: &mut TestNwk<'_>, responder: &mut TestNwk<'_>) -> u16 {
    assert!(seeker.nlme_network_discovery_request(CHANNEL, CHANNEL, 2));
    let request = seeker.mac.radio.next_transmitted().unwrap();
    assert!(seeker.process(MacEvent::TxDone(TxStatus::Success)).is_none());

    assert!(deliver(responder, &request).is_none());
    let beacon = responder.mac.radio.next_transmitted().unwrap();
    assert!(responder
        .process(MacEvent::TxDone(TxStatus::Success))
        .is_none());
    assert!(deliver(seeker, &beacon).is_none());

    // The scan window on the only channel closes.
    match seeker.process(MacEvent::TimerExpired) {
        Some(NwkUpper::NetworkDiscoveryConfirm { status, networks }) => {
            assert_eq!(status, Status::Success);
            assert_eq!(networks.len(), 1);
            assert_eq!(networks[0].pan_id, PAN);
            assert!(networks[0].permit_joining);
            networks[0].coordinator_address
        }
        _ => panic!("expected a discovery confirm"),
    }
}

/// Walk a child through the full association exchange with its parent and
/// return the short address both sides agreed on.
fn join(
    child: &mut TestNwk<'_>,
    parent: &mut TestNwk<'_>,
    as_router: bool,
) -> u16 {
    assert!(child.nlme_join_request(PAN, as_router));
    let request = child.mac.radio.next_transmitted().unwrap();
    assert!(child.process(MacEvent::TxDone(TxStatus::Success)).is_none());

    // The parent hears the request and parks its response; the hardware
    // acknowledgment reaches the child.
    assert!(deliver(parent, &request).is_none());
    assert!(deliver(child, &ack(seq_of(&request))).is_none());

    // The response window elapses and the child polls.
    assert!(child.process(MacEvent::TimerExpired).is_none());
    let poll = child.mac.radio.next_transmitted().unwrap();
    assert!(child.process(MacEvent::TxDone(TxStatus::Success)).is_none());

    assert!(deliver(parent, &poll).is_none());
    let response = parent.mac.radio.next_transmitted().unwrap();
    assert!(parent
        .process(MacEvent::TxDone(TxStatus::Success))
        .is_none());
    assert!(deliver(child, &ack(seq_of(&poll))).is_none());

    let confirmed = match deliver(child, &response) {
        Some(NwkUpper::JoinConfirm {
            status,
            short_address,
        }) => {
            assert_eq!(status, Status::Success);
            short_address
        }
        _ => panic!("expected a join confirm"),
    };

    match deliver(parent, &ack(seq_of(&response))) {
        Some(NwkUpper::JoinIndication { short_address, .. }) => {
            assert_eq!(short_address, confirmed);
        }
        _ => panic!("expected a join indication"),
    }

    confirmed
}

#[test]
fn three_node_tree_forms_joins_and_routes() {
    let coord_pool = pool();
    let router_pool = pool();
    let device_pool = pool();
    let mut coord = node(&coord_pool, 0x0c);
    let mut router = node(&router_pool, 0x0a);
    let mut device = node(&device_pool, 0x0e);

    // The coordinator forms the PAN.
    assert!(coord.nlme_network_formation_request(PAN, CHANNEL));

    // The router finds it, joins it, and takes up routing duties.
    assert_eq!(discover(&mut router, &mut coord), 0x0000);
    let router_address = join(&mut router, &mut coord, true);
    assert_eq!(router_address, 1);
    assert_eq!(router.depth(), 1);
    assert!(router.nlme_start_router_request());

    // The end device only hears the router's beacon and joins through it.
    assert_eq!(discover(&mut device, &mut router), router_address);
    let device_address = join(&mut device, &mut router, false);
    // The first end-device slot under router 1 in the default tree.
    assert_eq!(device_address, 1 + 6 * 861 + 1);
    assert_eq!(device.depth(), 2);

    // A frame from the leaf to the root. The first MAC hop climbs to the
    // parent router.
    assert!(device.nlde_data_request(0x0000, &[0xaa, 0xbb, 0xcc], None));
    let uplink = device.mac.radio.next_transmitted().unwrap();
    assert!(device.process(MacEvent::TxDone(TxStatus::Success)).is_none());

    let first = data_hop(&uplink);
    assert_eq!(first.mac_dst, Address::short(router_address));
    assert_eq!(first.mac_src, Address::short(device_address));
    assert_eq!(first.dst, 0x0000);
    assert_eq!(first.src, device_address);

    // The router relays; the device gets its hardware acknowledgment.
    assert!(deliver(&mut router, &uplink).is_none());
    match deliver(&mut device, &ack(seq_of(&uplink))) {
        Some(NwkUpper::DataConfirm { status }) => assert_eq!(status, Status::Success),
        _ => panic!("expected a data confirm"),
    }

    let relayed = router.mac.radio.next_transmitted().unwrap();
    assert!(router.process(MacEvent::TxDone(TxStatus::Success)).is_none());

    // One hop: the radius ticked down, the sequence ticked up, the NWK
    // addressing and the payload came through untouched.
    let second = data_hop(&relayed);
    assert_eq!(second.mac_dst, Address::short(0x0000));
    assert_eq!(second.mac_src, Address::short(router_address));
    assert_eq!(second.dst, 0x0000);
    assert_eq!(second.src, device_address);
    assert_eq!(second.radius, first.radius - 1);
    assert_eq!(second.seq, first.seq.wrapping_add(1));
    assert_eq!(second.payload, first.payload);
    assert_eq!(second.payload, [0xaa, 0xbb, 0xcc]);

    // The coordinator delivers it to its application.
    let indication = deliver(&mut coord, &relayed);
    match &indication {
        Some(NwkUpper::DataIndication {
            src_address,
            dst_address,
            payload,
            ..
        }) => {
            assert_eq!(*src_address, device_address);
            assert_eq!(*dst_address, 0x0000);
            assert_eq!(&payload[..], &[0xaa, 0xbb, 0xcc]);
        }
        _ => panic!("expected a data indication"),
    }

    match deliver(&mut router, &ack(seq_of(&relayed))) {
        Some(NwkUpper::DataConfirm { status }) => assert_eq!(status, Status::Success),
        _ => panic!("expected the relay's data confirm"),
    }

    // The frame crossed the air exactly twice.
    assert!(coord.mac.radio.next_transmitted().is_none());
    assert!(router.mac.radio.next_transmitted().is_none());
    assert!(device.mac.radio.next_transmitted().is_none());

    // Every pool buffer went home.
    drop(indication);
    for (pool, name) in [
        (&coord_pool, "coordinator"),
        (&router_pool, "router"),
        (&device_pool, "device"),
    ] {
        for partition in 0..2 {
            assert_eq!(
                pool.free_block_count(partition),
                pool.block_count(partition),
                "{} leaked a buffer",
                name,
            );
        }
    }
}
