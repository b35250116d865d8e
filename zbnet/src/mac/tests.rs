use super::constants::*;
use super::state::MacState;
use super::timer::tests::TestTimer;
use super::*;

use crate::frame::{
    AddressingMode, AssociationStatus, CommandId, Frame, FrameBuilder, FrameType,
};
use crate::phy::tests::TestRadio;

use rand::rngs::mock::StepRng;

use std::vec::Vec;

fn pool() -> BufferPool {
    BufferPool::new(&[(32, 4), (128, 4)]).unwrap()
}

fn mac(pool: &BufferPool) -> Mac<'_, TestRadio, TestTimer, StepRng> {
    let mut mac = Mac::new(
        TestRadio::new(),
        TestTimer::new(),
        pool,
        StepRng::new(0x42, 1),
    );
    mac.set_extended_address([0x02, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x01]);
    mac.mlme_reset_request(true);
    mac
}

fn emit(repr: &FrameRepr<'_>) -> Vec<u8> {
    let mut buffer = std::vec![0u8; repr.buffer_len()];
    let mut frame = Frame::new_unchecked(&mut buffer[..]);
    repr.emit(&mut frame);
    buffer
}

fn parse_transmitted(bytes: &[u8]) -> (FrameType, Option<CommandId>, u8) {
    let reader = Frame::new(bytes).unwrap();
    let repr = FrameRepr::parse(&reader).unwrap();
    let command = match repr.payload {
        FramePayload::Command(command) => Some(command.command_id()),
        _ => None,
    };
    (repr.frame_control.frame_type, command, repr.sequence_number)
}

fn ack(sequence_number: u8) -> Vec<u8> {
    emit(&FrameBuilder::new_ack(sequence_number).finalize().unwrap())
}

const COORD_EXT: [u8; 8] = [0x0c, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x0c];

#[test]
fn associate_request_gated_on_state() {
    let pool = pool();
    let mut mac = Mac::new(
        TestRadio::new(),
        TestTimer::new(),
        &pool,
        StepRng::new(0, 1),
    );

    // No reset yet.
    assert!(!mac.mlme_associate_request(
        15,
        0x1234,
        Address::short(0x0000),
        CapabilityInformation::ALLOCATE_ADDRESS,
    ));

    mac.mlme_reset_request(true);
    assert!(mac.mlme_associate_request(
        15,
        0x1234,
        Address::short(0x0000),
        CapabilityInformation::ALLOCATE_ADDRESS,
    ));
    assert_eq!(mac.state(), MacState::WaitingAssociationRequestAck);

    // Busy: a second request is refused.
    assert!(!mac.mlme_associate_request(
        15,
        0x1234,
        Address::short(0x0000),
        CapabilityInformation::ALLOCATE_ADDRESS,
    ));
}

#[test]
fn association_chain_polls_with_data_request() {
    let pool = pool();
    let mut mac = mac(&pool);

    assert!(mac.mlme_associate_request(
        15,
        0x1234,
        Address::short(0x0000),
        CapabilityInformation::ALLOCATE_ADDRESS | CapabilityInformation::RX_ON_WHEN_IDLE,
    ));

    let request = mac.radio.next_transmitted().unwrap();
    let (frame_type, command, request_seq) = parse_transmitted(&request);
    assert_eq!(frame_type, FrameType::MacCommand);
    assert_eq!(command, Some(CommandId::AssociationRequest));

    // The frame leaves the antenna; the acknowledgment wait is bounded.
    assert!(mac.process(MacEvent::TxDone(TxStatus::Success)).is_none());
    assert_eq!(mac.timer.last_started(), Some(ACK_WAIT_DURATION));

    // The coordinator acknowledges; the response window opens.
    mac.radio.inject(&ack(request_seq));
    assert!(mac.process(MacEvent::FrameReceived).is_none());
    assert_eq!(mac.state(), MacState::WaitingResponseWindow);
    assert_eq!(mac.timer.last_started(), Some(RESPONSE_WAIT_TIME));

    // The window elapses: the MAC polls on its own.
    assert!(mac.process(MacEvent::TimerExpired).is_none());
    let poll = mac.radio.next_transmitted().unwrap();
    let (_, command, poll_seq) = parse_transmitted(&poll);
    assert_eq!(command, Some(CommandId::DataRequest));
    assert_eq!(mac.state(), MacState::WaitingDataRequestAck);

    assert!(mac.process(MacEvent::TxDone(TxStatus::Success)).is_none());
    mac.radio.inject(&ack(poll_seq));
    assert!(mac.process(MacEvent::FrameReceived).is_none());
    assert_eq!(mac.state(), MacState::WaitingAssociationResponse);

    // The Association Response assigns the short address.
    let response = emit(
        &FrameBuilder::new_command(MacCommandRepr::AssociationResponse {
            short_address: 0x0001,
            status: AssociationStatus::Successful,
        })
        .set_sequence_number(7)
        .set_dst_pan_id(0x1234)
        .set_dst_address(Address::Extended(mac.extended_address()))
        .set_src_pan_id(0x1234)
        .set_src_address(Address::Extended(COORD_EXT))
        .set_ack_request(true)
        .finalize()
        .unwrap(),
    );
    mac.radio.inject(&response);

    match mac.process(MacEvent::FrameReceived) {
        Some(MacUpper::AssociateConfirm {
            status: Status::Success,
            short_address: 0x0001,
        }) => {}
        other => panic!("unexpected: {:?}", other),
    }
    assert_eq!(mac.state(), MacState::Associated);
    assert_eq!(mac.short_address(), 0x0001);
    assert_eq!(mac.pan_id(), 0x1234);
}

#[test]
fn association_without_ack_fails() {
    let pool = pool();
    let mut mac = mac(&pool);

    assert!(mac.mlme_associate_request(
        15,
        0x1234,
        Address::short(0x0000),
        CapabilityInformation::ALLOCATE_ADDRESS,
    ));
    assert!(mac.process(MacEvent::TxDone(TxStatus::Success)).is_none());

    match mac.process(MacEvent::TimerExpired) {
        Some(MacUpper::AssociateConfirm {
            status: Status::NoAck,
            ..
        }) => {}
        other => panic!("unexpected: {:?}", other),
    }
    assert_eq!(mac.state(), MacState::Idle);
    assert_eq!(mac.pan_id(), BROADCAST_PAN_ID);
}

#[test]
fn empty_response_window_confirms_no_data() {
    let pool = pool();
    let mut mac = mac(&pool);

    assert!(mac.mlme_associate_request(
        15,
        0x1234,
        Address::short(0x0000),
        CapabilityInformation::ALLOCATE_ADDRESS,
    ));
    let (_, _, request_seq) = parse_transmitted(&mac.radio.next_transmitted().unwrap());

    mac.process(MacEvent::TxDone(TxStatus::Success));
    mac.radio.inject(&ack(request_seq));
    mac.process(MacEvent::FrameReceived);
    mac.process(MacEvent::TimerExpired);
    let (_, _, poll_seq) = parse_transmitted(&mac.radio.next_transmitted().unwrap());
    mac.process(MacEvent::TxDone(TxStatus::Success));
    mac.radio.inject(&ack(poll_seq));
    mac.process(MacEvent::FrameReceived);
    assert_eq!(mac.state(), MacState::WaitingAssociationResponse);

    // No Association Response before the response wait expires.
    match mac.process(MacEvent::TimerExpired) {
        Some(MacUpper::AssociateConfirm {
            status: Status::NoData,
            ..
        }) => {}
        other => panic!("unexpected: {:?}", other),
    }
    assert_eq!(mac.state(), MacState::Idle);
}

#[test]
fn acknowledged_data_restores_prior_state() {
    let pool = pool();
    let mut mac = mac(&pool);
    assert!(mac.mlme_start_request(0x1234, 15));

    assert!(mac.mcps_data_request(
        0x1234,
        Address::short(0x0001),
        AddressingMode::Short,
        &[0xde, 0xad],
        true,
    ));
    assert_eq!(mac.state(), MacState::TxWaitingAck);

    let (_, _, sequence_number) = parse_transmitted(&mac.radio.next_transmitted().unwrap());
    mac.process(MacEvent::TxDone(TxStatus::Success));
    mac.radio.inject(&ack(sequence_number));

    match mac.process(MacEvent::FrameReceived) {
        Some(MacUpper::DataConfirm {
            status: Status::Success,
        }) => {}
        other => panic!("unexpected: {:?}", other),
    }
    // Not `Idle`: the coordinator goes back to `Started`.
    assert_eq!(mac.state(), MacState::Started);
}

#[test]
fn unacknowledged_data_confirms_on_tx_done() {
    let pool = pool();
    let mut mac = mac(&pool);
    assert!(mac.mlme_start_request(0x1234, 15));

    assert!(mac.mcps_data_request(
        0x1234,
        Address::BROADCAST,
        AddressingMode::Short,
        &[0x01],
        false,
    ));
    assert_eq!(mac.state(), MacState::Started);

    match mac.process(MacEvent::TxDone(TxStatus::Success)) {
        Some(MacUpper::DataConfirm {
            status: Status::Success,
        }) => {}
        other => panic!("unexpected: {:?}", other),
    };
}

#[test]
fn acknowledged_broadcast_rejected() {
    let pool = pool();
    let mut mac = mac(&pool);
    assert!(mac.mlme_start_request(0x1234, 15));

    assert!(!mac.mcps_data_request(
        0x1234,
        Address::BROADCAST,
        AddressingMode::Short,
        &[0x01],
        true,
    ));
    assert_eq!(mac.state(), MacState::Started);
}

#[test]
fn coordinator_parks_response_until_poll() {
    let pool = pool();
    let mut mac = mac(&pool);
    assert!(mac.mlme_start_request(0x1234, 15));

    let device = [0x0d, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x0d];
    let request = emit(
        &FrameBuilder::new_command(MacCommandRepr::AssociationRequest {
            capability: CapabilityInformation::ALLOCATE_ADDRESS,
        })
        .set_sequence_number(3)
        .set_dst_pan_id(0x1234)
        .set_dst_address(Address::short(0x0000))
        .set_src_pan_id(BROADCAST_PAN_ID)
        .set_src_address(Address::Extended(device))
        .set_ack_request(true)
        .finalize()
        .unwrap(),
    );
    mac.radio.inject(&request);

    match mac.process(MacEvent::FrameReceived) {
        Some(MacUpper::AssociateIndication {
            device: indicated, ..
        }) => assert_eq!(indicated, device),
        other => panic!("unexpected: {:?}", other),
    }

    assert!(mac.mlme_associate_response(device, 0x0001, AssociationStatus::Successful));
    // The response is parked, not transmitted.
    assert!(mac.radio.next_transmitted().is_none());

    let poll = emit(
        &FrameBuilder::new_command(MacCommandRepr::DataRequest)
            .set_sequence_number(4)
            .set_dst_pan_id(0x1234)
            .set_dst_address(Address::short(0x0000))
            .set_src_pan_id(BROADCAST_PAN_ID)
            .set_src_address(Address::Extended(device))
            .set_ack_request(true)
            .finalize()
            .unwrap(),
    );
    mac.radio.inject(&poll);
    assert!(mac.process(MacEvent::FrameReceived).is_none());
    assert_eq!(mac.state(), MacState::WaitingAssociationResponseAck);

    let response = mac.radio.next_transmitted().unwrap();
    let (_, command, response_seq) = parse_transmitted(&response);
    assert_eq!(command, Some(CommandId::AssociationResponse));

    mac.process(MacEvent::TxDone(TxStatus::Success));
    mac.radio.inject(&ack(response_seq));
    match mac.process(MacEvent::FrameReceived) {
        Some(MacUpper::CommStatus {
            status: Status::Success,
            device: indicated,
        }) => assert_eq!(indicated, device),
        other => panic!("unexpected: {:?}", other),
    }
    assert_eq!(mac.state(), MacState::Started);
    // The parked buffer went back to the pool.
    assert_eq!(pool.free_block_count(0), Some(4));
}

#[test]
fn active_scan_collects_descriptors() {
    let pool = pool();
    let mut mac = mac(&pool);

    assert!(mac.mlme_scan_request(ScanKind::Active, 11, 12, 3));
    assert_eq!(mac.state(), MacState::BusyScanning);
    assert_eq!(mac.timer.last_started(), Some(scan_duration(3)));

    let (_, command, _) = parse_transmitted(&mac.radio.next_transmitted().unwrap());
    assert_eq!(command, Some(CommandId::BeaconRequest));

    let beacon = emit(
        &FrameBuilder::new_beacon(BeaconRepr {
            beacon_order: 15,
            superframe_order: 15,
            final_cap_slot: 15,
            battery_life_extension: false,
            pan_coordinator: true,
            association_permit: true,
        })
        .set_sequence_number(9)
        .set_src_pan_id(0x1234)
        .set_src_address(Address::short(0x0000))
        .finalize()
        .unwrap(),
    );

    // Heard twice on the same channel: recorded once.
    mac.radio.inject(&beacon);
    match mac.process(MacEvent::FrameReceived) {
        Some(MacUpper::BeaconNotify { descriptor }) => {
            assert_eq!(descriptor.pan_id, 0x1234);
            assert_eq!(descriptor.channel, 11);
            assert!(descriptor.association_permit);
        }
        other => panic!("unexpected: {:?}", other),
    }
    mac.radio.inject(&beacon);
    mac.process(MacEvent::FrameReceived);

    // Next channel, then the scan ends.
    assert!(mac.process(MacEvent::TimerExpired).is_none());
    assert_eq!(mac.radio.channel, 12);

    match mac.process(MacEvent::TimerExpired) {
        Some(MacUpper::ScanConfirm {
            status: Status::Success,
            kind: ScanKind::Active,
            descriptors,
        }) => {
            assert_eq!(descriptors.len(), 1);
            assert_eq!(descriptors[0].coord_address, Address::short(0x0000));
        }
        other => panic!("unexpected: {:?}", other),
    }
    assert_eq!(mac.state(), MacState::Idle);
}

#[test]
fn orphan_scan_realignment_rejoins() {
    let pool = pool();
    let mut mac = mac(&pool);

    assert!(mac.mlme_scan_request(ScanKind::Orphan, 11, 26, 1));
    let (_, command, _) = parse_transmitted(&mac.radio.next_transmitted().unwrap());
    assert_eq!(command, Some(CommandId::OrphanNotification));

    let realignment = emit(
        &FrameBuilder::new_command(MacCommandRepr::CoordinatorRealignment {
            pan_id: 0x1234,
            coord_short_address: 0x0000,
            channel: 15,
            short_address: 0x0005,
        })
        .set_sequence_number(2)
        .set_dst_pan_id(BROADCAST_PAN_ID)
        .set_dst_address(Address::Extended(mac.extended_address()))
        .set_src_pan_id(0x1234)
        .set_src_address(Address::short(0x0000))
        .finalize()
        .unwrap(),
    );
    mac.radio.inject(&realignment);

    match mac.process(MacEvent::FrameReceived) {
        Some(MacUpper::ScanConfirm {
            status: Status::Success,
            kind: ScanKind::Orphan,
            ..
        }) => {}
        other => panic!("unexpected: {:?}", other),
    }
    assert_eq!(mac.state(), MacState::Associated);
    assert_eq!(mac.pan_id(), 0x1234);
    assert_eq!(mac.short_address(), 0x0005);
    assert_eq!(mac.radio.channel, 15);
}

#[test]
fn data_indication_carries_pool_buffer() {
    let pool = pool();
    let mut mac = mac(&pool);
    assert!(mac.mlme_start_request(0x1234, 15));

    let data = emit(
        &FrameBuilder::new_data(&[0x11, 0x22, 0x33])
            .set_sequence_number(5)
            .set_dst_pan_id(0x1234)
            .set_dst_address(Address::short(0x0000))
            .set_src_pan_id(0x1234)
            .set_src_address(Address::short(0x0001))
            .finalize()
            .unwrap(),
    );
    mac.radio.inject(&data);

    match mac.process(MacEvent::FrameReceived) {
        Some(MacUpper::DataIndication(indication)) => {
            assert_eq!(&indication.payload[..], &[0x11, 0x22, 0x33]);
            assert_eq!(indication.src_address, Address::short(0x0001));
            assert_eq!(pool.free_block_count(0), Some(3));
        }
        other => panic!("unexpected: {:?}", other),
    }
    // Dropping the indication returned the buffer.
    assert_eq!(pool.free_block_count(0), Some(4));
}

#[test]
fn frames_for_other_pans_are_ignored() {
    let pool = pool();
    let mut mac = mac(&pool);
    assert!(mac.mlme_start_request(0x1234, 15));

    let data = emit(
        &FrameBuilder::new_data(&[0x01])
            .set_sequence_number(5)
            .set_dst_pan_id(0x5678)
            .set_dst_address(Address::short(0x0000))
            .set_src_pan_id(0x5678)
            .set_src_address(Address::short(0x0001))
            .finalize()
            .unwrap(),
    );
    mac.radio.inject(&data);
    assert!(mac.process(MacEvent::FrameReceived).is_none());
}
