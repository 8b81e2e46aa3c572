use embedded_hal_mock::eh1::pwm::{Mock as PwmMock, Transaction as PwmTrans};
use tcr_core::utils::connection::link::{ControlLink, LinkState, RECONNECT_DELAY_MS};
use tcr_core::utils::connection::server::{dispatch_line, halt, SessionManager};
use tcr_core::utils::controllers::{
    DriveCommand, DriveController, DriveOutputs, Headlight, DRIVE_CHANNEL,
};
use tcr_core::utils::session::ControllerSession;
use tcr_core::utils::wire::{ControlError, DriveFrame, MAX_FRAME_LEN};

/// Create a single expected duty write of `value`.
pub fn write(value: u16) -> [PwmTrans; 1] {
    [PwmTrans::set_duty_cycle(value)]
}

/// Build a controller whose five channels each expect exactly one duty
/// write: the four motor values in frame order, then the headlight.
pub fn single_write_controller(
    motors: [u16; 4],
    light: u16,
) -> (DriveController<PwmMock>, [PwmMock; 5]) {
    let lf = PwmMock::new(&write(motors[0]));
    let lb = PwmMock::new(&write(motors[1]));
    let rf = PwmMock::new(&write(motors[2]));
    let rb = PwmMock::new(&write(motors[3]));
    let headlight = PwmMock::new(&write(light));

    let controller = DriveController::new(
        DriveOutputs::new(lf.clone(), lb.clone(), rf.clone(), rb.clone()),
        Headlight::new(headlight.clone()),
    );
    (controller, [lf, lb, rf, rb, headlight])
}

#[test]
fn test_decoded_frame_reaches_every_channel() {
    // One duty write per H-bridge input plus the headlight, raw values.
    let (frame, clean) = DriveFrame::decode("1000,200,0,0,150,128").unwrap();
    assert!(clean);

    let (mut controller, mocks) = single_write_controller([200, 0, 0, 150], 128);
    controller.execute(DriveCommand::Apply(frame)).unwrap();
    for mut mock in mocks {
        mock.done();
    }
}

#[test]
fn test_halt_zeroes_every_channel() {
    let (mut controller, mocks) = single_write_controller([0, 0, 0, 0], 0);
    controller.execute(DriveCommand::Halt).unwrap();
    for mut mock in mocks {
        mock.done();
    }
}

#[test]
fn test_delimiter_frame_zeroes_the_outputs() {
    // Six empty tokens decode as an all-zero frame and still get applied.
    let (frame, clean) = DriveFrame::decode(",,,,,").unwrap();
    assert!(!clean);

    let (mut controller, mocks) = single_write_controller([0, 0, 0, 0], 0);
    controller.execute(DriveCommand::Apply(frame)).unwrap();
    for mut mock in mocks {
        mock.done();
    }
}

/// The seam between decode and actuation: rejected lines queue nothing
/// for the drive task, while accepted lines and halts land in order.
#[test]
fn test_dispatch_gates_the_drive_queue() {
    embassy_futures::block_on(async {
        assert_eq!(dispatch_line("").await, Err(ControlError::Malformed));
        let oversized = "1".repeat(MAX_FRAME_LEN + 1);
        assert_eq!(dispatch_line(&oversized).await, Err(ControlError::Oversized));
        assert!(DRIVE_CHANNEL.try_receive().is_err());

        dispatch_line("1000,200,0,0,150,128").await.unwrap();
        let (frame, _) = DriveFrame::decode("1000,200,0,0,150,128").unwrap();
        assert_eq!(DRIVE_CHANNEL.try_receive().unwrap(), DriveCommand::Apply(frame));

        halt().await;
        assert_eq!(DRIVE_CHANNEL.try_receive().unwrap(), DriveCommand::Halt);
        assert!(DRIVE_CHANNEL.try_receive().is_err());
    });
}

#[test]
fn test_out_of_range_values_pass_through_raw() {
    // The vehicle does not range-check; the wire value is the duty value.
    let (frame, clean) = DriveFrame::decode("1,999,0,0,0,400").unwrap();
    assert!(clean);

    let (mut controller, mocks) = single_write_controller([999, 0, 0, 0], 400);
    controller.execute(DriveCommand::Apply(frame)).unwrap();
    for mut mock in mocks {
        mock.done();
    }
}

/// A full pilot step: stick sample through the session, over the wire,
/// decoded and applied to the PWM channels.
#[test]
fn test_stick_to_motor_pipeline() {
    let mut session = ControllerSession::new();
    let line = session.steer(1.0, 0.0, None, 41_000).unwrap();
    assert_eq!(line, "41000,0,255,255,0,0");

    let (frame, clean) = DriveFrame::decode(&line).unwrap();
    assert!(clean);

    let (mut controller, mocks) = single_write_controller([0, 255, 255, 0], 0);
    controller.execute(DriveCommand::Apply(frame)).unwrap();
    for mut mock in mocks {
        mock.done();
    }
}

/// Link drop and recovery: a drop arms one retry, the retry dials once.
#[test]
fn test_link_drop_arms_a_single_retry() {
    let mut link = ControlLink::new();
    assert!(link.connect());
    assert!(link.opened());

    link.errored(ControlError::TransportError, 5_000);
    link.closed(5_010);
    assert_eq!(link.state(), LinkState::Disconnected);

    assert!(!link.poll_reconnect(5_000 + RECONNECT_DELAY_MS - 1));
    assert!(link.poll_reconnect(5_000 + RECONNECT_DELAY_MS));
    assert!(!link.poll_reconnect(6_000));
}

/// Session registry round trip: create, touch, purge, list, remove.
#[test]
fn test_session_registry_lifecycle() {
    embassy_futures::block_on(async {
        SessionManager::create_session("alpha".to_string(), 100).await;
        SessionManager::create_session("beta".to_string(), 200).await;

        assert!(SessionManager::update_session("alpha", 150).await);
        assert!(SessionManager::update_session("alpha", 180).await);
        assert!(!SessionManager::update_session("ghost", 150).await);

        let alpha = SessionManager::get_session("alpha").await.unwrap();
        assert_eq!(alpha.last_seen, 180);
        assert_eq!(alpha.frames, 2);

        SessionManager::purge_stale_sessions(190).await;
        let sessions = SessionManager::list_sessions().await;
        assert_eq!(sessions, vec!["beta".to_string()]);

        assert!(SessionManager::remove_session("beta").await);
        assert!(SessionManager::list_sessions().await.is_empty());
    });
}
