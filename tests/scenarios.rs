//! End-to-end behaviour of the main loop against a recording platform.

mod common;

use common::{run_ms, AsleepView, Event, MockPlatform, RecordingControl, RecordingGame};

use tilekernel::button::ButtonFlags;
use tilekernel::color::PixelColor;
use tilekernel::config::{IR_HEADER_CONTROL, IR_HEADER_USER, SLEEP_TIMEOUT_MS};
use tilekernel::ir::{crc8, encode_frame};
use tilekernel::kernel::{Kernel, SharedState, TickContext};
use tilekernel::power::PowerState;

fn user_frame(payload: &[u8]) -> Vec<u8> {
    let mut buf = [0u8; 64];
    encode_frame(IR_HEADER_USER, payload, &mut buf).unwrap().to_vec()
}

#[test]
fn test_start_enables_drivers_and_runs_setup_once() {
    let shared = SharedState::new();
    let mut kernel = Kernel::new(&shared, MockPlatform::new(), RecordingGame::new());
    kernel.start();

    assert_eq!(kernel.game().setups, 1);
    assert!(kernel.platform().ir.enabled);
    assert!(kernel.platform().pixels.enabled);
    assert_eq!(
        kernel.platform().events(),
        vec![Event::IrEnable, Event::PixelsEnable, Event::PullUp]
    );
    assert!(!shared.sleep_timer.is_expired(shared.clock.snapshot()));
    assert_eq!(shared.sleep_timer.timeout_ms(), SLEEP_TIMEOUT_MS);
}

#[test]
fn test_user_frame_is_exposed_without_header_and_checksum() {
    let shared = SharedState::new();
    let mut kernel = Kernel::new(&shared, MockPlatform::new(), RecordingGame::new());
    kernel.start();

    let frame = [0x01, 0xAB, 0xCD, crc8(&[0x01, 0xAB, 0xCD])];
    kernel.platform_mut().ir.inject(0, &frame);
    kernel.step();

    let seen = kernel.game().last();
    assert_eq!(seen.ir[0], Some(vec![0xAB, 0xCD]));
    assert!(seen.ir[1..].iter().all(Option::is_none));
    assert!(kernel.platform().ir.is_ready(0));
    assert_eq!(kernel.ir_stats().user, 1);
}

#[test]
fn test_unacknowledged_user_frame_is_offered_again() {
    let shared = SharedState::new();
    let mut kernel = Kernel::new(&shared, MockPlatform::new(), RecordingGame::new());
    kernel.start();

    kernel.platform_mut().ir.inject(3, &user_frame(&[7]));
    kernel.step();
    kernel.step();

    assert_eq!(kernel.game().seen[0].ir[3], Some(vec![7]));
    assert_eq!(kernel.game().seen[1].ir[3], Some(vec![7]));
    assert!(!kernel
        .platform()
        .events()
        .contains(&Event::IrMarkRead(3)));
}

#[test]
fn test_waiting_user_frame_is_counted_once() {
    let shared = SharedState::new();
    let mut kernel = Kernel::new(&shared, MockPlatform::new(), RecordingGame::new());
    kernel.start();

    kernel.platform_mut().ir.inject(2, &user_frame(&[5, 6]));
    for _ in 0..5 {
        kernel.step();
    }

    assert!(kernel.game().seen.iter().all(|seen| seen.ir[2] == Some(vec![5, 6])));
    assert_eq!(kernel.ir_stats().user, 1);
}

#[test]
fn test_acknowledging_a_face_out_of_range_frees_nothing() {
    let shared = SharedState::new();
    let game = RecordingGame::scripted(|_, output| {
        output.acknowledge(9);
        output.set_color(9, PixelColor::RED);
    });
    let mut kernel = Kernel::new(&shared, MockPlatform::new(), game);
    kernel.start();
    kernel.platform_mut().clear_events();

    kernel.platform_mut().ir.inject(1, &user_frame(&[1]));
    kernel.step();
    kernel.step();

    assert!(kernel.platform().ir.is_ready(1));
    assert_eq!(kernel.game().last().ir[1], Some(vec![1]));
    assert_eq!(kernel.platform().events(), vec![Event::Present, Event::Present]);
}

#[test]
fn test_acknowledged_user_frame_frees_the_slot() {
    let shared = SharedState::new();
    let game = RecordingGame::scripted(|input, output| {
        for (face, payload) in input.ir.iter().enumerate() {
            if payload.ready {
                output.acknowledge(face);
            }
        }
    });
    let mut kernel = Kernel::new(&shared, MockPlatform::new(), game);
    kernel.start();

    kernel.platform_mut().ir.inject(1, &user_frame(&[1, 2, 3]));
    kernel.step();
    assert!(!kernel.platform().ir.is_ready(1));
    assert!(kernel.platform().events().contains(&Event::IrMarkRead(1)));

    kernel.step();
    assert_eq!(kernel.game().last().ir[1], None);

    // Slot is free for the next frame
    kernel.platform_mut().ir.inject(1, &user_frame(&[4]));
    kernel.step();
    assert_eq!(kernel.game().last().ir[1], Some(vec![4]));
}

#[test]
fn test_short_frame_is_discarded_and_slot_reusable() {
    let shared = SharedState::new();
    let mut kernel = Kernel::new(&shared, MockPlatform::new(), RecordingGame::new());
    kernel.start();

    kernel.platform_mut().ir.inject(2, &[0x01]);
    kernel.step();

    assert_eq!(kernel.game().last().ir[2], None);
    assert!(!kernel.platform().ir.is_ready(2));
    assert_eq!(kernel.ir_stats().too_short, 1);

    kernel.platform_mut().ir.inject(2, &user_frame(&[9]));
    kernel.step();
    assert_eq!(kernel.game().last().ir[2], Some(vec![9]));
}

#[test]
fn test_corrupted_frame_is_discarded_without_routing() {
    let shared = SharedState::new();
    let mut kernel = Kernel::new(&shared, MockPlatform::new(), RecordingGame::new())
        .with_control_handler(RecordingControl::default());
    kernel.start();

    let mut frame = user_frame(&[0xAB, 0xCD]);
    *frame.last_mut().unwrap() ^= 0x01;
    kernel.platform_mut().ir.inject(0, &frame);

    let mut buf = [0u8; 8];
    let mut control = encode_frame(IR_HEADER_CONTROL, &[5], &mut buf).unwrap().to_vec();
    control[1] ^= 0x80;
    kernel.platform_mut().ir.inject(4, &control);

    kernel.step();

    assert!(kernel.game().last().ir.iter().all(Option::is_none));
    assert!(kernel.control_handler().packets.is_empty());
    assert!(!kernel.platform().ir.is_ready(0));
    assert!(!kernel.platform().ir.is_ready(4));
    assert_eq!(kernel.ir_stats().bad_checksum, 2);
}

#[test]
fn test_control_frame_is_consumed_before_the_game_runs() {
    let shared = SharedState::new();
    let mut kernel = Kernel::new(&shared, MockPlatform::new(), RecordingGame::new())
        .with_control_handler(RecordingControl::default());
    kernel.start();

    let mut buf = [0u8; 8];
    let frame = encode_frame(IR_HEADER_CONTROL, &[0x10, 0x20], &mut buf).unwrap().to_vec();
    kernel.platform_mut().ir.inject(5, &frame);
    kernel.platform().clear_events();
    kernel.step();

    assert_eq!(kernel.control_handler().packets, vec![(5, vec![0x10, 0x20])]);
    assert_eq!(kernel.game().last().ir[5], None);
    assert_eq!(kernel.platform().events()[0], Event::IrMarkRead(5));
    assert_eq!(kernel.ir_stats().control, 1);

    // Next frame on the same face is validated normally
    kernel.platform_mut().ir.inject(5, &user_frame(&[1]));
    kernel.step();
    assert_eq!(kernel.game().last().ir[5], Some(vec![1]));
}

#[test]
fn test_unknown_header_is_discarded() {
    let shared = SharedState::new();
    let mut kernel = Kernel::new(&shared, MockPlatform::new(), RecordingGame::new());
    kernel.start();

    let mut buf = [0u8; 8];
    let frame = encode_frame(0x33, &[1, 2], &mut buf).unwrap().to_vec();
    kernel.platform_mut().ir.inject(0, &frame);
    kernel.step();

    assert_eq!(kernel.game().last().ir[0], None);
    assert!(!kernel.platform().ir.is_ready(0));
    assert_eq!(kernel.ir_stats().unknown_header, 1);
}

#[test]
fn test_only_changed_colors_reach_the_driver() {
    let shared = SharedState::new();
    let mut iteration = 0;
    let game = RecordingGame::scripted(move |_, output| {
        iteration += 1;
        match iteration {
            1 => {
                output.set_color(1, PixelColor::GREEN);
                output.set_color(4, PixelColor::BLUE);
            }
            2 => output.set_color(1, PixelColor::GREEN),
            3 => output.set_color(4, PixelColor::RED),
            _ => {}
        }
    });
    let mut kernel = Kernel::new(&shared, MockPlatform::new(), game);
    kernel.start();
    kernel.platform().clear_events();

    for _ in 0..4 {
        kernel.step();
    }

    assert_eq!(
        kernel.platform().events(),
        vec![
            Event::PixelWrite(1, PixelColor::GREEN),
            Event::PixelWrite(4, PixelColor::BLUE),
            Event::Present,
            Event::Present,
            Event::PixelWrite(4, PixelColor::RED),
            Event::Present,
            Event::Present,
        ]
    );
    assert_eq!(kernel.platform().pixels.presents, 4);
    assert_eq!(kernel.output().color(4), PixelColor::RED);
}

#[test]
fn test_button_events_are_delivered_once() {
    let shared = SharedState::new();
    let mut tick = TickContext::new();
    let mut kernel = Kernel::new(&shared, MockPlatform::new(), RecordingGame::new());
    kernel.start();

    run_ms(&mut tick, &shared, 20, true);
    kernel.step();
    let seen = kernel.game().last().clone();
    assert_eq!(seen.flags, ButtonFlags::PRESSED);
    assert!(seen.down);
    assert_eq!(seen.millis, 20);

    kernel.step();
    assert!(kernel.game().last().flags.is_empty());
    assert!(kernel.game().last().down);

    run_ms(&mut tick, &shared, 10, false);
    kernel.step();
    let seen = kernel.game().last();
    assert_eq!(seen.flags, ButtonFlags::RELEASED);
    assert_eq!(seen.click_count, 1);
    assert!(!seen.down);
}

#[test]
fn test_millis_snapshot_is_monotonic_across_iterations() {
    let shared = SharedState::new();
    let mut tick = TickContext::new();
    let mut kernel = Kernel::new(&shared, MockPlatform::new(), RecordingGame::new());
    kernel.start();

    for ms in [0, 1, 7, 0, 250] {
        run_ms(&mut tick, &shared, ms, false);
        kernel.step();
    }
    let millis: Vec<u32> = kernel.game().seen.iter().map(|s| s.millis).collect();
    assert_eq!(millis, vec![0, 1, 8, 8, 258]);
}

#[test]
fn test_inactivity_puts_tile_to_sleep_and_button_wakes_it() {
    let shared = SharedState::with_sleep_timeout(1_000);
    let mut tick = TickContext::new();
    let mut kernel = Kernel::new(&shared, MockPlatform::new(), RecordingGame::new());
    kernel.start();

    run_ms(&mut tick, &shared, 999, false);
    kernel.step();
    assert!(kernel.platform().sleeps.is_empty());
    assert_eq!(kernel.power_state(), PowerState::Active);

    run_ms(&mut tick, &shared, 1, false);
    kernel.platform().clear_events();
    kernel.step();

    // Slept after the game ran and the frame was presented
    assert_eq!(kernel.game().seen.len(), 2);
    assert_eq!(
        kernel.platform().sleeps,
        vec![AsleepView {
            ir_enabled: false,
            pixels_enabled: false,
            wake_armed: true,
        }]
    );
    assert_eq!(
        kernel.platform().events(),
        vec![
            Event::Present,
            Event::PixelsDisable,
            Event::IrDisable,
            Event::WakeOn,
            Event::Sleep,
            Event::WakeOff,
            Event::IrEnable,
            Event::PixelsEnable,
        ]
    );

    // Back to active with drivers on
    assert_eq!(kernel.power_state(), PowerState::Active);
    assert!(kernel.platform().ir.enabled);
    assert!(kernel.platform().pixels.enabled);
    assert!(!kernel.platform().button.wake_armed);

    // The wake edge shows up as ordinary button input
    run_ms(&mut tick, &shared, 5, true);
    kernel.step();
    assert!(kernel.game().last().woke);
    assert!(kernel.game().last().flags.contains(ButtonFlags::PRESSED));

    kernel.step();
    assert!(!kernel.game().last().woke);
    assert_eq!(kernel.platform().sleeps.len(), 1);
}

#[test]
fn test_wake_rearms_sleep_timer() {
    let shared = SharedState::with_sleep_timeout(100);
    let mut tick = TickContext::new();
    let mut kernel = Kernel::new(&shared, MockPlatform::new(), RecordingGame::new());
    kernel.start();

    run_ms(&mut tick, &shared, 100, false);
    kernel.step();
    assert_eq!(kernel.platform().sleeps.len(), 1);

    // No tick saw the wake edge, still no immediate second sleep
    kernel.step();
    assert_eq!(kernel.platform().sleeps.len(), 1);
    run_ms(&mut tick, &shared, 99, false);
    kernel.step();
    assert_eq!(kernel.platform().sleeps.len(), 1);
    run_ms(&mut tick, &shared, 1, false);
    kernel.step();
    assert_eq!(kernel.platform().sleeps.len(), 2);
}

#[test]
fn test_button_activity_postpones_sleep() {
    let shared = SharedState::with_sleep_timeout(1_000);
    let mut tick = TickContext::new();
    let mut kernel = Kernel::new(&shared, MockPlatform::new(), RecordingGame::new());
    kernel.start();

    run_ms(&mut tick, &shared, 800, false);
    run_ms(&mut tick, &shared, 30, true);
    run_ms(&mut tick, &shared, 30, false);
    kernel.step();

    // Release at 831 ms; the single click closes 330 ms later, at 1161 ms,
    // which is the last activity and pushes the deadline to 2161 ms
    run_ms(&mut tick, &shared, 900, false);
    kernel.step();
    assert!(kernel.game().last().flags.contains(ButtonFlags::SINGLE_CLICKED));

    run_ms(&mut tick, &shared, 400, false);
    kernel.step();
    assert!(kernel.platform().sleeps.is_empty());

    run_ms(&mut tick, &shared, 1, false);
    kernel.step();
    assert_eq!(kernel.platform().sleeps.len(), 1);
}
