// demos/bench.rs

use multirotor_stabilization::{
    AttitudeEstimator, Axis, CommandSource, Mode, MotorActuation, MotorCommands, PerAxis,
    Stabilization, StabilizationConfig,
};

/// Rigid airframe with a crude first order response to motor differentials.
struct Airframe {
    angle: PerAxis<f32>,
    rate: PerAxis<f32>,
    offsets_computed: bool,
}

impl AttitudeEstimator<f32> for Airframe {
    fn are_offsets_computed(&self) -> bool {
        self.offsets_computed
    }

    fn compute_offsets(&mut self) {
        self.offsets_computed = true;
    }

    fn angular_rates(&mut self) -> PerAxis<f32> {
        self.rate
    }

    fn accel_angles(&mut self) -> PerAxis<f32> {
        self.angle
    }
}

/// Pilot holding a fixed stick position.
struct Pilot {
    demand: PerAxis<f32>,
    mode: Mode,
    throttle: i32,
}

impl CommandSource<f32> for Pilot {
    fn demand(&mut self, axis: Axis) -> f32 {
        self.demand[axis]
    }

    fn flying_mode(&mut self) -> Mode {
        self.mode
    }

    fn throttle(&mut self, min_power: i32, max_throttle: i32) -> i32 {
        self.throttle.clamp(min_power, max_throttle)
    }
}

/// ESCs driven by a 1000 to 2000 microsecond pulse.
struct Escs {
    last: MotorCommands<4>,
}

impl MotorActuation<4> for Escs {
    type Timer = ();

    fn attach_timer(&mut self, _timer: ()) {}

    fn max_power(&self) -> i32 {
        2000
    }

    fn min_power(&self) -> i32 {
        1000
    }

    fn max_throttle_percent(&self) -> i32 {
        80
    }

    fn max_throttle(&self) -> i32 {
        1800
    }

    fn idle_threshold(&self) -> i32 {
        1050
    }

    fn dispatch(&mut self, commands: &MotorCommands<4>) {
        self.last = *commands;
    }
}

fn main() {
    let config = StabilizationConfig::default();
    let airframe = Airframe {
        angle: PerAxis::new(8.0, -5.0, 0.0),
        rate: PerAxis::splat(0.0),
        offsets_computed: false,
    };
    let pilot = Pilot {
        demand: PerAxis::splat(0.0),
        mode: Mode::Angle,
        throttle: 1500,
    };
    let escs = Escs {
        last: MotorCommands::splat(1000),
    };

    let mut engine = match Stabilization::quad_x(config, airframe, pilot, escs) {
        Ok(engine) => engine,
        Err(error) => {
            eprintln!("invalid configuration: {error}");
            return;
        }
    };
    engine.attach_motors_timer(());
    engine.init();

    let mut dump = String::new();
    engine
        .write_angle_parameters(&mut dump)
        .expect("writing to a String cannot fail");
    engine
        .write_accro_parameters(&mut dump)
        .expect("writing to a String cannot fail");
    println!("{dump}");

    let dt = 0.0025;
    println!("   t,     roll,    pitch,   FR,   FL,   RR,   RL");
    for step in 0..=400 {
        let commands = match engine.tick(dt) {
            Ok(commands) => commands,
            Err(error) => {
                eprintln!("tick failed: {error}");
                break;
            }
        };

        // Simulate response: differential power accelerates the airframe.
        let [fr, fl, rr, rl] = commands.0.map(|power| power as f32);
        let airframe = engine.attitude_mut();
        airframe.rate[Axis::Roll] += ((fr + rr) - (fl + rl)) * 0.02 * dt * 100.0;
        airframe.rate[Axis::Pitch] += ((fr + fl) - (rr + rl)) * 0.02 * dt * 100.0;
        airframe.rate[Axis::Roll] *= 0.98;
        airframe.rate[Axis::Pitch] *= 0.98;
        airframe.angle[Axis::Roll] += airframe.rate[Axis::Roll] * dt;
        airframe.angle[Axis::Pitch] += airframe.rate[Axis::Pitch] * dt;

        if step % 40 == 0 {
            let state = engine.angular_state();
            println!(
                "{:.2}, {:-8.3}, {:-8.3}, {}, {}, {}, {}",
                step as f32 * dt,
                state.position[Axis::Roll],
                state.position[Axis::Pitch],
                fr,
                fl,
                rr,
                rl
            );
        }
    }

    println!("last dispatch: {:?}", engine.motors().last.power());
    println!("{:?}", engine.diagnostics());
}
