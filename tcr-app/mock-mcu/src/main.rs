use clap::Parser;
use embassy_executor::{Executor, Spawner};
use embassy_net::{Config, Ipv4Address, Ipv4Cidr, Runner, StackResources};
use embassy_net_tuntap::TunTapDevice;
use embassy_time::{Duration, Timer};
use embedded_hal::pwm::SetDutyCycle;
use heapless::Vec;
use rand_core::{OsRng, TryRngCore};
use static_cell::StaticCell;
use std::convert::Infallible;
use tcr_core::mk_static;
use tcr_core::utils::connection::link::RECONNECT_DELAY_MS;
use tcr_core::utils::connection::server::SessionManager;
use tcr_core::utils::controllers::{DriveController, DriveOutputs, Headlight};
use tcr_core::utils::math::circle::CircleBound;
use tcr_core::utils::session::input::POLL_INTERVAL_MS;
use tcr_core::utils::session::{ControllerSession, InputSource, PadSample};
use tcr_core::utils::wire::ControlError;
use tcr_core::utils::wss;
use tracing::info;

#[derive(Parser)]
#[clap(version = "1.0")]
struct Opts {
    /// TAP device name
    #[clap(long, default_value = "tap0")]
    tap: String,
    /// use a static IP instead of DHCP
    #[clap(long)]
    static_ip: bool,
    /// control server port
    #[clap(long, default_value_t = 8000)]
    port: u16,
    /// run a scripted pilot against the session pipeline and exit
    #[clap(long)]
    pilot_demo: bool,
}

/// PWM channel that logs duty writes instead of toggling a pin.
struct ConsolePwm {
    label: &'static str,
}

impl ConsolePwm {
    fn new(label: &'static str) -> Self {
        Self { label }
    }
}

impl embedded_hal::pwm::ErrorType for ConsolePwm {
    type Error = Infallible;
}

impl SetDutyCycle for ConsolePwm {
    fn max_duty_cycle(&self) -> u16 {
        255
    }

    fn set_duty_cycle(&mut self, duty: u16) -> Result<(), Self::Error> {
        info!("pwm {}: {}", self.label, duty);
        Ok(())
    }
}

/// Scripted stick sweep standing in for a gamepad.
///
/// Walks a circle of radius 1.4 so roughly half the samples land outside
/// the stick bound and exercise the clamp.
struct ScriptedPilot {
    step: u32,
    bound: CircleBound,
}

impl InputSource for ScriptedPilot {
    fn poll(&mut self) -> Option<PadSample> {
        if self.step >= 40 {
            return None;
        }
        let theta = self.step as f32 * 0.157;
        let (x, y) = self.bound.clamp(1.4 * theta.cos(), 1.4 * theta.sin());
        let sample = PadSample {
            x,
            y,
            light: Some((self.step % 10) as f32 / 10.0),
            gear_down: self.step == 20,
            gear_up: false,
        };
        self.step += 1;
        Some(sample)
    }
}

#[embassy_executor::task]
async fn net_task(mut runner: Runner<'static, TunTapDevice>) -> ! {
    runner.run().await
}

#[embassy_executor::task]
async fn drive_task(mut controller: DriveController<ConsolePwm>) -> ! {
    controller.run().await
}

#[embassy_executor::task]
async fn session_sweep() -> ! {
    loop {
        Timer::after(Duration::from_secs(60)).await;
        let now = embassy_time::Instant::now().as_secs();
        SessionManager::purge_stale_sessions(now.saturating_sub(300)).await;
        let active = SessionManager::list_sessions().await;
        info!("controller sessions after sweep: {:?}", active);
    }
}

/// Drive a scripted pilot through the session pipeline and print the wire
/// lines it would put on the socket, then exercise a link drop.
fn pilot_demo() {
    let mut pilot = ScriptedPilot {
        step: 0,
        bound: CircleBound::new(),
    };
    let mut session = ControllerSession::new();

    if session.link.connect() {
        info!("pilot dialing rover");
    }
    if session.link.opened() {
        info!("link open, stream attached");
    }

    let mut now_ms = 0u64;
    while let Some(sample) = pilot.poll() {
        if let Some(line) = session.tick(&sample, now_ms) {
            info!("tx {}", line);
        }
        now_ms += POLL_INTERVAL_MS;
    }

    session.link.errored(ControlError::TransportClosed, now_ms);
    if session.link.poll_reconnect(now_ms + RECONNECT_DELAY_MS) {
        info!("link dropped, dialing again");
    }
}

#[embassy_executor::task]
async fn main_task(spawner: Spawner) {
    let opts: Opts = Opts::parse();

    if opts.pilot_demo {
        pilot_demo();
        std::process::exit(0);
    }

    // PWM channels that log writes instead of toggling pins
    let outputs = DriveOutputs::new(
        ConsolePwm::new("left-forward"),
        ConsolePwm::new("left-backward"),
        ConsolePwm::new("right-forward"),
        ConsolePwm::new("right-backward"),
    );
    let headlight = Headlight::new(ConsolePwm::new("headlight"));
    spawner
        .spawn(drive_task(DriveController::new(outputs, headlight)))
        .unwrap();
    spawner.spawn(session_sweep()).unwrap();

    // Initialize the network over the TAP device
    let device = TunTapDevice::new(&opts.tap).unwrap();
    let config = if opts.static_ip {
        Config::ipv4_static(embassy_net::StaticConfigV4 {
            address: Ipv4Cidr::new(Ipv4Address::new(192, 168, 69, 2), 24),
            dns_servers: Vec::new(),
            gateway: Some(Ipv4Address::new(192, 168, 69, 1)),
        })
    } else {
        Config::dhcpv4(Default::default())
    };

    let mut seed_buf = [0; 8];
    OsRng.try_fill_bytes(&mut seed_buf).unwrap();
    let seed = u64::from_le_bytes(seed_buf);

    let (stack, runner) = embassy_net::new(
        device,
        config,
        mk_static!(StackResources<3>, StackResources::<3>::new()),
        seed,
    );
    spawner.spawn(net_task(runner)).unwrap();

    info!("Waiting for network link...");
    stack.wait_config_up().await;

    info!("Starting control server on port {}", opts.port);
    wss(0, opts.port, stack, None).await;
}

static EXECUTOR: StaticCell<Executor> = StaticCell::new();

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();
    let executor = EXECUTOR.init(Executor::new());
    executor.run(|spawner| {
        spawner.spawn(main_task(spawner)).unwrap();
    });
}
