//! End-to-end pipeline scenario: CAN ingress decodes onto the bus, a Logic
//! channel derives from it, an alert latches, and a display rule switches
//! screens — one `Orchestrator::tick` pass wiring every subsystem together
//! (`spec.md` §4.8).

use racing_core::alerts::{AlertRule, Comparator, Severity};
use racing_core::can::ByteOrder;
use racing_core::channel::types::{
    CanDataType, CanRxConfig, CanTimeoutPolicy, ChannelDef, ChannelKind, LogicConfig,
};
use racing_core::display::DisplayRule;
use racing_core::ingress::{CanRxFrame, IngressEvent};
use racing_core::math::ops::LogicOp;
use racing_core::orchestrator::Orchestrator;

fn coolant_channel() -> ChannelDef {
    ChannelDef::new(
        1,
        "coolant_raw",
        "C",
        ChannelKind::CanRx(CanRxConfig {
            message_id: 0x200,
            extended: false,
            start_bit: 0,
            bit_length: 16,
            data_type: CanDataType::Unsigned,
            byte_order: ByteOrder::LittleEndian,
            scale: 0.1,
            offset: 0.0,
            timeout_ms: 2_000,
            timeout_policy: CanTimeoutPolicy::HoldLast,
            default_value: 0.0,
        }),
        1,
    )
}

fn coolant_clamped_channel() -> ChannelDef {
    let mut inputs = heapless::Vec::new();
    inputs.push(1).unwrap();
    ChannelDef::new(
        2,
        "coolant_clamped",
        "C",
        ChannelKind::Logic(LogicConfig {
            operation: LogicOp::Clamp,
            inputs,
            params: [0.0, 110.0, 0.0, 0.0],
            state: f64::NAN,
        }),
        1,
    )
}

#[test]
fn can_frame_flows_through_logic_alerts_and_display_in_one_tick() {
    let mut orch = Orchestrator::new(0);
    orch.registry.register(coolant_channel()).unwrap();
    orch.registry.register(coolant_clamped_channel()).unwrap();
    orch.rebuild_math_order().unwrap();

    orch.alerts
        .add_rule(AlertRule::new(1, "coolant_raw", Comparator::Gt, 110.0, Severity::Critical, true))
        .unwrap();

    orch.display
        .add_rule(DisplayRule {
            id: 1,
            priority: 10,
            channel_name: heapless::String::try_from("coolant_raw").unwrap(),
            comparator: Comparator::Gt,
            threshold: 110.0,
            target_screen_id: 9,
        })
        .unwrap();

    let producer = orch.ingress_producer();
    let mut frame = CanRxFrame {
        iface: 0,
        id: 0x200,
        extended: false,
        fd: false,
        brs: false,
        rtr: false,
        dlc: 8,
        data: [0u8; 64],
        now_ms: 0,
    };
    // 1200 raw * 0.1 scale => 120.0 degrees C, over the 110.0 threshold.
    frame.data[0..2].copy_from_slice(&1200u16.to_le_bytes());
    producer.send(IngressEvent::CanRxFrame(frame));

    orch.tick(0);

    assert_eq!(orch.bus.get_numeric("coolant_raw"), Some(120.0));
    assert_eq!(orch.bus.get_numeric("coolant_clamped"), Some(110.0), "logic channel clamps the over-limit reading");
    assert_eq!(orch.alerts.is_active(1), Some(true));
    assert_eq!(orch.display.current_screen_id(), 9);
    assert_eq!(orch.can_error_count(), 0);

    // Coolant drops back under threshold; the latched alert stays active
    // until acknowledged, but the display rule re-evaluates every tick.
    let mut cooled = CanRxFrame {
        iface: 0,
        id: 0x200,
        extended: false,
        fd: false,
        brs: false,
        rtr: false,
        dlc: 8,
        data: [0u8; 64],
        now_ms: 10,
    };
    cooled.data[0..2].copy_from_slice(&900u16.to_le_bytes());
    producer.send(IngressEvent::CanRxFrame(cooled));
    orch.tick(10);

    assert_eq!(orch.bus.get_numeric("coolant_raw"), Some(90.0));
    assert_eq!(orch.alerts.is_active(1), Some(true), "latched alert survives until acknowledged");
    assert_eq!(orch.display.current_screen_id(), 0, "display rule re-evaluates and falls back");

    orch.alerts.acknowledge(1).unwrap();
    assert_eq!(orch.alerts.is_active(1), Some(false));
}

#[test]
fn gps_fix_drives_lap_timer_publication() {
    use racing_core::ingress::GpsFix;
    use racing_core::lap::geo::{GeoPoint, Line};
    use racing_core::lap::timer::Track;

    let mut orch = Orchestrator::new(0);
    let track = Track {
        name: heapless::String::try_from("test_oval").unwrap(),
        start_finish: Line {
            p1: GeoPoint::new(0.0, -0.0002),
            p2: GeoPoint::new(0.0, 0.0002),
            radius_m: 20.0,
            required_heading_deg: None,
            heading_tolerance_deg: 0.0,
        },
        sectors: heapless::Vec::new(),
    };
    orch.lap_timer.set_track(track);

    let producer = orch.ingress_producer();
    producer.send(IngressEvent::GpsFix(GpsFix {
        lat: -0.01,
        lon: 0.0,
        alt: 0.0,
        speed_mps: 40.0,
        heading_deg: 0.0,
        sats: 9,
        fix_valid: true,
        hdop: 1.0,
        utc_ms: 0,
        now_ms: 0,
    }));
    orch.tick(0);
    assert_eq!(orch.bus.get_digital("gps.fix_valid"), Some(true));

    producer.send(IngressEvent::GpsFix(GpsFix {
        lat: 0.0,
        lon: 0.0,
        alt: 0.0,
        speed_mps: 40.0,
        heading_deg: 0.0,
        sats: 9,
        fix_valid: true,
        hdop: 1.0,
        utc_ms: 0,
        now_ms: 1_000,
    }));
    orch.tick(1_000);

    assert_eq!(orch.bus.get_numeric("lap.number"), Some(1.0));
}
