// src/engine.rs

//! # Stabilization Engine
//!
//! The engine owns the collaborators, the seven control loops, the
//! complementary filter and the mixer, and runs one control tick at a time:
//!
//! 1. read gyro rates and accelerometer angles, fuse them into the
//!    [`AngularState`];
//! 2. read the throttle and fall back to [`Mode::Idle`] below the idle
//!    threshold;
//! 3. run the roll and pitch cascade of the active mode and the yaw rate loop;
//! 4. mix, clamp and dispatch one set of motor commands.
//!
//! Exactly one mode is active per tick. Leaving a mode resets its cascade and
//! the shared yaw loop, so no integrator carries stale wind-up into a later
//! activation. Idle resets every loop.
//!
//! Execution is single threaded and nothing blocks. The host drives the
//! engine from its fixed period timer and passes the measured period of
//! every tick.

use core::fmt;

use num_traits::NumCast;

use crate::error::{Result, StabilizationError};
use crate::filter::ComplementaryFilter;
use crate::hal::{AttitudeEstimator, CommandSource, Mode, MotorActuation};
use crate::mixing::{from_power, Mixer, MotorCommands, MotorMix, PowerBounds, QUAD_X};
use crate::pid::ControlLoop;
use crate::{
    AngleStabilizer, AngularState, Axis, FlightStabilizer, Number, RateStabilizer,
    StabilizationConfig,
};

/// Counters for bench tuning. Saturation and sensor glitches are expected
/// operating conditions, so they are counted here instead of being reported
/// as errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Diagnostics {
    /// Motor command sets dispatched.
    pub ticks: u32,
    /// Ticks with at least one motor clamped.
    pub saturated_ticks: u32,
    /// Motors clamped on the last tick, bit `i` for motor `i`.
    pub saturated_mask: u32,
    /// Ticks with a non-finite sensor sample or loop period.
    pub invalid_sample_ticks: u32,
    /// Control law requests rejected because offsets were not computed.
    pub uncalibrated_ticks: u32,
}

/// The flight stabilization engine for `N` motors.
pub struct Stabilization<T: Number, A, C, M, const N: usize = 4> {
    config: StabilizationConfig<T>,
    filter: ComplementaryFilter<T>,
    state: AngularState<T>,
    accro: RateStabilizer<T>,
    angle: AngleStabilizer<T>,
    yaw: ControlLoop<T>,
    mixer: Mixer<T, N>,
    mode: Mode,
    throttle: i32,
    last_commands: MotorCommands<N>,
    diagnostics: Diagnostics,
    attitude: A,
    commands: C,
    motors: M,
}

impl<T, A, C, M> Stabilization<T, A, C, M, 4>
where
    T: Number + NumCast,
    A: AttitudeEstimator<T>,
    C: CommandSource<T>,
    M: MotorActuation<4>,
{
    /// Creates an engine for a quadcopter in X configuration.
    pub fn quad_x(
        config: StabilizationConfig<T>,
        attitude: A,
        commands: C,
        motors: M,
    ) -> Result<Self> {
        Self::new(config, QUAD_X, attitude, commands, motors)
    }
}

impl<T, A, C, M, const N: usize> Stabilization<T, A, C, M, N>
where
    T: Number + NumCast,
    A: AttitudeEstimator<T>,
    C: CommandSource<T>,
    M: MotorActuation<N>,
{
    /// Creates an engine from a validated configuration and a motor layout.
    pub fn new(
        config: StabilizationConfig<T>,
        layout: [MotorMix; N],
        attitude: A,
        commands: C,
        motors: M,
    ) -> Result<Self> {
        config.validate()?;
        let filter = ComplementaryFilter::new(config.filter_time_constant)?;
        let bounds = PowerBounds::new(motors.min_power(), motors.max_power())?;

        Ok(Stabilization {
            filter,
            state: AngularState::at_rest(T::zero()),
            accro: RateStabilizer::with_config(config.accro_rate),
            angle: AngleStabilizer::with_config(config.angle_position, config.angle_rate),
            yaw: ControlLoop::with_config(config.yaw_rate),
            mixer: Mixer::new(config.mixing_weight, layout),
            mode: Mode::Idle,
            throttle: bounds.min,
            last_commands: MotorCommands::splat(bounds.min),
            diagnostics: Diagnostics::default(),
            config,
            attitude,
            commands,
            motors,
        })
    }

    /// Prepares the engine for flight: every loop is reset, the engine
    /// enters Idle, and the attitude offsets are computed if they are not
    /// yet. Call once at startup while the vehicle is stationary and level.
    pub fn init(&mut self) {
        info!("stabilization init");
        self.reset_pid();
        self.mode = Mode::Idle;
        self.state = AngularState::at_rest(T::zero());
        if !self.attitude.are_offsets_computed() {
            info!("computing attitude offsets");
            self.attitude.compute_offsets();
        }
    }

    /// Replaces the configuration. Every loop is reset.
    pub fn reconfigure(&mut self, config: StabilizationConfig<T>) -> Result<()> {
        config.validate()?;
        self.filter = ComplementaryFilter::new(config.filter_time_constant)?;
        self.accro.configure(config.accro_rate);
        self.angle.configure(config.angle_position, config.angle_rate);
        self.yaw.configure(config.yaw_rate);
        self.mixer.set_weight(config.mixing_weight);
        self.config = config;
        Ok(())
    }

    /// Runs one tick in the mode selected by the command source.
    ///
    /// Stays in Idle while the attitude offsets are not computed. A forced
    /// Idle from the command source is honored on any tick.
    pub fn tick(&mut self, dt: T) -> Result<MotorCommands<N>> {
        if self.require_calibrated().is_err() {
            return Ok(self.last_commands);
        }
        self.update_attitude(dt);
        match self.commands.flying_mode() {
            Mode::Idle => Ok(self.idle()),
            mode => self.fly(mode, dt),
        }
    }

    /// Holds every motor at minimum power and resets every control loop.
    pub fn idle(&mut self) -> MotorCommands<N> {
        self.enter_mode(Mode::Idle);
        self.reset_pid();
        let commands = MotorCommands::splat(self.motors.min_power());
        self.diagnostics.saturated_mask = 0;
        self.send(commands);
        commands
    }

    /// Runs one Accro (rate) mode tick.
    ///
    /// Returns [`StabilizationError::Uncalibrated`] with the motors held at
    /// minimum power if the attitude offsets are not computed.
    pub fn accro(&mut self, dt: T) -> Result<MotorCommands<N>> {
        self.require_calibrated()?;
        self.update_attitude(dt);
        self.fly(Mode::Accro, dt)
    }

    /// Runs one Angle (self-leveling) mode tick.
    ///
    /// Returns [`StabilizationError::Uncalibrated`] with the motors held at
    /// minimum power if the attitude offsets are not computed.
    pub fn angle(&mut self, dt: T) -> Result<MotorCommands<N>> {
        self.require_calibrated()?;
        self.update_attitude(dt);
        self.fly(Mode::Angle, dt)
    }

    /// Resets every control loop of every cascade.
    pub fn reset_pid(&mut self) {
        self.accro.reset();
        self.angle.reset();
        self.yaw.reset();
    }

    /// Whether the current throttle command is below the idle threshold.
    pub fn is_throttle_idle(&mut self) -> bool {
        self.throttle() < self.motors.idle_threshold()
    }

    /// The throttle command, mapped onto the motor throttle range.
    pub fn throttle(&mut self) -> i32 {
        let min_power = self.motors.min_power();
        let max_throttle = self.motors.max_throttle();
        self.commands.throttle(min_power, max_throttle)
    }

    /// The flying mode currently selected by the command source.
    pub fn flying_mode(&mut self) -> Mode {
        self.commands.flying_mode()
    }

    /// Hands the PWM timer capability over to the motor actuation.
    pub fn attach_motors_timer(&mut self, timer: M::Timer) {
        self.motors.attach_timer(timer);
    }

    /// Highest motor power.
    pub fn motors_max_power(&self) -> i32 {
        self.motors.max_power()
    }

    /// Lowest motor power.
    pub fn motors_min_power(&self) -> i32 {
        self.motors.min_power()
    }

    /// Share of the power range available to the throttle, in percent.
    pub fn motors_max_throttle_percent(&self) -> i32 {
        self.motors.max_throttle_percent()
    }

    /// Highest throttle command.
    pub fn motors_max_throttle(&self) -> i32 {
        self.motors.max_throttle()
    }

    /// Throttle below which the motors idle.
    pub fn motors_idle_threshold(&self) -> i32 {
        self.motors.idle_threshold()
    }

    /// Whether the attitude offsets have been computed.
    pub fn are_attitude_offsets_computed(&self) -> bool {
        self.attitude.are_offsets_computed()
    }

    /// Asks the attitude estimator to compute its offsets.
    pub fn attitude_compute_offsets(&mut self) {
        self.attitude.compute_offsets();
    }

    /// The mode that ran on the last tick.
    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// The measured angular state of the last tick.
    pub fn angular_state(&self) -> &AngularState<T> {
        &self.state
    }

    /// The motor commands dispatched on the last tick.
    pub fn last_commands(&self) -> MotorCommands<N> {
        self.last_commands
    }

    /// Tuning counters.
    pub fn diagnostics(&self) -> Diagnostics {
        self.diagnostics
    }

    /// The active configuration.
    pub fn config(&self) -> &StabilizationConfig<T> {
        &self.config
    }

    /// The complementary filter state.
    pub fn filter(&self) -> &ComplementaryFilter<T> {
        &self.filter
    }

    /// The attitude estimator.
    pub fn attitude_mut(&mut self) -> &mut A {
        &mut self.attitude
    }

    /// The command source.
    pub fn commands_mut(&mut self) -> &mut C {
        &mut self.commands
    }

    /// The motor actuation.
    pub fn motors(&self) -> &M {
        &self.motors
    }

    fn require_calibrated(&mut self) -> Result<()> {
        if self.attitude.are_offsets_computed() {
            return Ok(());
        }
        warn!("control law rejected: attitude offsets not computed");
        self.diagnostics.uncalibrated_ticks = self.diagnostics.uncalibrated_ticks.wrapping_add(1);
        self.idle();
        Err(StabilizationError::Uncalibrated)
    }

    fn enter_mode(&mut self, next: Mode) {
        if next == self.mode {
            return;
        }
        debug!("mode {} -> {}", self.mode, next);
        match self.mode {
            Mode::Idle => {}
            Mode::Accro => self.accro.reset(),
            Mode::Angle => self.angle.reset(),
        }
        self.yaw.reset();
        self.mode = next;
    }

    fn update_attitude(&mut self, dt: T) {
        let rates = self.attitude.angular_rates();
        let accel = self.attitude.accel_angles();
        let dt_valid = dt.is_finite_number() && T::zero() < dt;

        let mut invalid = !dt_valid;
        for axis in Axis::ALL {
            let rate = rates[axis];
            self.state.rate[axis] = rate;
            if !dt_valid || !rate.is_finite_number() {
                invalid = true;
                continue;
            }
            let position = self.state.position[axis];
            self.state.position[axis] = match axis {
                Axis::Yaw => wrap_heading(position + rate * dt),
                Axis::Roll | Axis::Pitch => {
                    if !accel[axis].is_finite_number() {
                        invalid = true;
                        continue;
                    }
                    self.filter.fuse(position, rate, accel[axis], dt)
                }
            };
        }

        if invalid {
            warn!("invalid attitude sample, holding affected loops");
            self.diagnostics.invalid_sample_ticks =
                self.diagnostics.invalid_sample_ticks.wrapping_add(1);
        }
    }

    fn fly(&mut self, mode: Mode, dt: T) -> Result<MotorCommands<N>> {
        let result = self.try_fly(mode, dt);
        if result.is_err() {
            warn!("flight tick failed, motors idled");
            self.idle();
        }
        result
    }

    fn try_fly(&mut self, mode: Mode, dt: T) -> Result<MotorCommands<N>> {
        let bounds = PowerBounds::new(self.motors.min_power(), self.motors.max_power())?;
        self.throttle = self.throttle();
        if self.throttle < self.motors.idle_threshold() {
            return Ok(self.idle());
        }

        self.enter_mode(mode);
        let (roll, pitch) = match mode {
            Mode::Idle => return Ok(self.idle()),
            Mode::Accro => {
                let set_point = self.stick_set_point(self.config.max_rate);
                self.accro.control(set_point, &self.state, dt)
            }
            Mode::Angle => {
                let set_point = self.stick_set_point(self.config.max_angle);
                self.angle.control(set_point, &self.state, dt)
            }
        };
        let yaw_set_point = self.stick(Axis::Yaw, self.config.max_yaw_rate);
        let yaw = self
            .yaw
            .compute(yaw_set_point, self.state.rate[Axis::Yaw], dt);

        let throttle = from_power(self.throttle)?;
        let output = self.mixer.mix(throttle, (roll, pitch, yaw), bounds)?;

        let mask = output
            .saturated
            .iter()
            .enumerate()
            .filter(|(_, saturated)| **saturated)
            .fold(0u32, |mask, (motor, _)| {
                mask | 1u32.checked_shl(motor as u32).unwrap_or(0)
            });
        self.diagnostics.saturated_mask = mask;
        if output.any_saturated() {
            self.diagnostics.saturated_ticks = self.diagnostics.saturated_ticks.wrapping_add(1);
        }
        self.send(output.commands);
        Ok(output.commands)
    }

    fn stick(&mut self, axis: Axis, scale: T) -> T {
        self.commands.demand(axis).clamp(-T::one(), T::one()) * scale
    }

    fn stick_set_point(&mut self, scale: T) -> (T, T) {
        (self.stick(Axis::Roll, scale), self.stick(Axis::Pitch, scale))
    }

    fn send(&mut self, commands: MotorCommands<N>) {
        self.motors.dispatch(&commands);
        self.last_commands = commands;
        self.diagnostics.ticks = self.diagnostics.ticks.wrapping_add(1);
    }
}

impl<T, A, C, M, const N: usize> Stabilization<T, A, C, M, N>
where
    T: Number + fmt::Display,
{
    /// Writes the Accro mode gains, for bench tuning.
    pub fn write_accro_parameters<W: fmt::Write>(&self, out: &mut W) -> fmt::Result {
        writeln!(out, "Accro mode parameters:")?;
        write!(out, "{}", self.config.accro_rate)?;
        writeln!(out, "  yaw:   {}", self.config.yaw_rate)?;
        writeln!(
            out,
            "  max rate {} deg/s, max yaw rate {} deg/s",
            self.config.max_rate, self.config.max_yaw_rate
        )
    }

    /// Writes the Angle mode gains, for bench tuning.
    pub fn write_angle_parameters<W: fmt::Write>(&self, out: &mut W) -> fmt::Result {
        writeln!(out, "Angle mode parameters:")?;
        writeln!(out, " position:")?;
        write!(out, "{}", self.config.angle_position)?;
        writeln!(out, " rate:")?;
        write!(out, "{}", self.config.angle_rate)?;
        writeln!(out, "  yaw:   {}", self.config.yaw_rate)?;
        writeln!(
            out,
            "  max angle {} deg, max yaw rate {} deg/s",
            self.config.max_angle, self.config.max_yaw_rate
        )
    }
}

// Keeps the gyro-integrated heading within (-180, 180].
fn wrap_heading<T: Number + NumCast>(heading: T) -> T {
    let (Some(half), Some(full)) = (
        <T as NumCast>::from(180),
        <T as NumCast>::from(360),
    ) else {
        return heading;
    };
    if half < heading {
        heading - full
    } else if heading <= -half {
        heading + full
    } else {
        heading
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mixing::{FRONT_LEFT, FRONT_RIGHT, REAR_LEFT, REAR_RIGHT};
    use crate::pid::LoopConfig;
    use crate::test_utils::*;
    use crate::{CascadeConfig, PerAxis};

    type Engine = Stabilization<f32, MockAttitude, MockCommands, MockMotors>;

    /// Proportional-only configuration with wide limits.
    fn proportional_config() -> StabilizationConfig<f32> {
        let mut config = StabilizationConfig::new();
        config.angle_position = CascadeConfig::symmetric(LoopConfig::new(2.0, 0.0, 0.0, 50.0, 200.0));
        config.angle_rate = CascadeConfig::symmetric(LoopConfig::new(1.0, 0.0, 0.0, 50.0, 400.0));
        config.accro_rate = CascadeConfig::symmetric(LoopConfig::new(1.0, 0.0, 0.0, 50.0, 400.0));
        config.yaw_rate = LoopConfig::new(1.0, 0.0, 0.0, 50.0, 400.0);
        config.max_rate = 100.0;
        config.max_yaw_rate = 100.0;
        config.max_angle = 30.0;
        config.filter_time_constant = 0.5;
        config
    }

    /// Configuration whose Accro roll loop integrates.
    fn integrating_config() -> StabilizationConfig<f32> {
        let mut config = proportional_config();
        config.accro_rate = CascadeConfig::symmetric(LoopConfig::new(1.0, 1.0, 0.0, 100.0, 1000.0));
        config.angle_rate = config.accro_rate;
        config
    }

    fn engine(config: StabilizationConfig<f32>) -> Engine {
        let mut engine = Stabilization::quad_x(
            config,
            MockAttitude::calibrated(),
            MockCommands::flying(Mode::Accro, 1000),
            MockMotors::new(),
        )
        .unwrap();
        engine.init();
        engine
    }

    /// Full positive roll stick in Accro: 1000 + 0.5 * 100 = 1050, clamped to 1023.
    #[test]
    fn test_accro_full_roll_stick_saturates_front_right() {
        let mut engine = engine(proportional_config());
        engine.commands.demand = PerAxis::new(1.0, 0.0, 0.0);

        let commands = engine.accro(0.0025).unwrap();

        assert!(value_close(100.0, engine.accro.roll.output()));
        assert_eq!(1023, commands[FRONT_RIGHT]);
        assert_eq!(1023, commands[REAR_RIGHT]);
        assert_eq!(950, commands[FRONT_LEFT]);
        assert_eq!(950, commands[REAR_LEFT]);
        assert_eq!(Some(commands), engine.motors.dispatched);
        assert_eq!(1, engine.motors.dispatch_count);
        assert_eq!(Mode::Accro, engine.mode());
        let mask = (1 << FRONT_RIGHT) | (1 << REAR_RIGHT);
        assert_eq!(mask, engine.diagnostics().saturated_mask);
        assert_eq!(1, engine.diagnostics().saturated_ticks);
    }

    /// Below the idle threshold every motor gets minimum power, whatever the sticks.
    #[test]
    fn test_idle_gating_ignores_sticks() {
        let mut engine = engine(proportional_config());
        engine.commands.demand = PerAxis::new(1.0, -1.0, 1.0);
        engine.commands.throttle = MOCK_IDLE_THRESHOLD - 1;

        for commands in [engine.accro(0.0025).unwrap(), engine.angle(0.0025).unwrap()] {
            assert_eq!(MotorCommands::splat(MOCK_MIN_POWER), commands);
        }
        assert!(engine.is_throttle_idle());
        assert_eq!(Mode::Idle, engine.mode());
    }

    /// Control laws are rejected until the offsets are computed.
    #[test]
    fn test_uncalibrated_stays_idle() {
        let mut engine = Stabilization::quad_x(
            proportional_config(),
            MockAttitude::default(),
            MockCommands::flying(Mode::Angle, 1000),
            MockMotors::new(),
        )
        .unwrap();

        assert_eq!(Err(StabilizationError::Uncalibrated), engine.accro(0.0025));
        assert_eq!(Err(StabilizationError::Uncalibrated), engine.angle(0.0025));
        let commands = engine.tick(0.0025).unwrap();

        assert_eq!(MotorCommands::splat(MOCK_MIN_POWER), commands);
        assert_eq!(Some(commands), engine.motors.dispatched);
        assert_eq!(Mode::Idle, engine.mode());
        assert_eq!(3, engine.diagnostics().uncalibrated_ticks);

        engine.init();
        assert!(engine.are_attitude_offsets_computed());
        assert_eq!(1, engine.attitude.offset_requests);
        assert!(engine.tick(0.0025).is_ok());
        assert_eq!(Mode::Angle, engine.mode());
    }

    /// An integral built in Accro does not survive a trip through Angle.
    #[test]
    fn test_mode_switch_does_not_carry_integral() {
        let mut engine = engine(integrating_config());
        engine.commands.demand = PerAxis::new(0.5, 0.0, 0.0);

        for _ in 0..10 {
            engine.accro(0.0025).unwrap();
        }
        assert!(value_not_close(0.0, engine.accro.roll.integral()));

        engine.angle(0.0025).unwrap();
        assert!(value_close(0.0, engine.accro.roll.integral()));

        engine.accro(0.0025).unwrap();
        assert!(
            value_close(0.0, engine.accro.roll.integral()),
            "Integral should be zero on the first tick back in Accro."
        );
        assert!(value_close(50.0, engine.accro.roll.output()));
    }

    /// The shared yaw loop starts proportional-only after every mode change.
    #[test]
    fn test_mode_switch_resets_yaw_integral() {
        let mut config = integrating_config();
        config.yaw_rate = LoopConfig::new(1.0, 1.0, 0.0, 100.0, 1000.0);
        let mut engine = engine(config);
        engine.commands.demand = PerAxis::new(0.0, 0.0, 0.5);

        for _ in 0..10 {
            engine.accro(0.0025).unwrap();
        }
        assert!(value_not_close(0.0, engine.yaw.integral()));

        engine.angle(0.0025).unwrap();
        assert!(value_close(0.0, engine.yaw.integral()));

        engine.accro(0.0025).unwrap();
        assert!(
            value_close(0.0, engine.yaw.integral()),
            "Yaw integral should be zero on the first tick back in Accro."
        );
        assert!(value_close(50.0, engine.yaw.output()));
    }

    /// Angle mode state is reset when Accro takes over.
    #[test]
    fn test_leaving_angle_resets_angle_cascade() {
        let mut engine = engine(integrating_config());
        engine.commands.demand = PerAxis::new(0.5, 0.5, 0.0);

        for _ in 0..10 {
            engine.angle(0.0025).unwrap();
        }
        assert!(value_not_close(0.0, engine.angle.rate_roll.integral()));

        engine.accro(0.0025).unwrap();

        assert!(value_close(0.0, engine.angle.rate_roll.integral()));
        assert!(value_close(0.0, engine.angle.position_roll.output()));
    }

    /// A forced Idle from the command source wins on any tick.
    #[test]
    fn test_forced_idle_mid_flight() {
        let mut engine = engine(integrating_config());
        engine.commands.demand = PerAxis::new(0.5, 0.5, 0.5);
        for _ in 0..5 {
            engine.tick(0.0025).unwrap();
        }
        assert_eq!(Mode::Accro, engine.mode());

        engine.commands.mode = Mode::Idle;
        let commands = engine.tick(0.0025).unwrap();

        assert_eq!(MotorCommands::splat(MOCK_MIN_POWER), commands);
        assert_eq!(Mode::Idle, engine.mode());
        assert!(value_close(0.0, engine.accro.roll.integral()));
        assert!(value_close(0.0, engine.yaw.integral()));
    }

    /// The engine fuses gyro and accelerometer with the measured period.
    #[test]
    fn test_attitude_fusion_through_engine() {
        let mut engine = engine(proportional_config());
        engine.state.position[Axis::Roll] = 10.0;
        engine.attitude.rates = PerAxis::new(20.0, 0.0, 0.0);
        engine.attitude.accel = PerAxis::new(10.05, 0.0, 0.0);

        engine.accro(0.0025).unwrap();

        let coefficient = 0.5 / (0.0025 + 0.5);
        assert!(value_close(coefficient, engine.filter().coefficient()));
        let position = engine.angular_state().position[Axis::Roll];
        assert!((10.05 - position).abs() < 1e-3);
        assert!(value_close(20.0, engine.angular_state().rate[Axis::Roll]));
    }

    /// Yaw has no accelerometer reference and integrates the gyro only.
    #[test]
    fn test_yaw_position_integrates_gyro() {
        let mut engine = engine(proportional_config());
        engine.attitude.rates = PerAxis::new(0.0, 0.0, 100.0);
        engine.attitude.accel = PerAxis::new(0.0, 0.0, 45.0);

        for _ in 0..4 {
            engine.accro(0.0025).unwrap();
        }

        assert!(value_close(1.0, engine.angular_state().position[Axis::Yaw]));
    }

    #[test]
    fn test_wrap_heading() {
        assert!(value_close(-179.0, wrap_heading(181.0_f32)));
        assert!(value_close(180.0, wrap_heading(-180.0_f32)));
        assert!(value_close(90.0, wrap_heading(90.0_f32)));
    }

    /// Angle mode levels a tilted airframe through the cascade.
    #[test]
    fn test_angle_mode_levels_tilt() {
        let mut engine = engine(proportional_config());
        engine.commands.throttle = 500;
        engine.state.position[Axis::Roll] = 10.0;
        engine.attitude.accel = PerAxis::new(10.0, 0.0, 0.0);

        let commands = engine.angle(0.0025).unwrap();

        // Outer: 2 * (0 - 10) = -20 deg/s. Inner: 1 * (-20 - 0) = -20.
        assert!(value_close(-20.0, engine.angle.rate_roll.output()));
        assert_eq!(490, commands[FRONT_RIGHT]);
        assert_eq!(510, commands[FRONT_LEFT]);
        assert_eq!(490, commands[REAR_RIGHT]);
        assert_eq!(510, commands[REAR_LEFT]);
    }

    /// A non-finite gyro sample freezes the affected loop for one tick.
    #[test]
    fn test_invalid_sample_holds_output() {
        let mut engine = engine(proportional_config());
        engine.attitude.rates = PerAxis::new(10.0, 0.0, 0.0);
        let first = engine.accro(0.0025).unwrap();

        engine.attitude.rates = PerAxis::new(f32::NAN, 0.0, 0.0);
        let frozen = engine.accro(0.0025).unwrap();

        assert_eq!(first, frozen);
        assert_eq!(1, engine.diagnostics().invalid_sample_ticks);
        assert!(value_close(-10.0, engine.accro.roll.output()));
    }

    /// A non-positive period freezes every loop and leaves the filter alone.
    #[test]
    fn test_invalid_period_holds_output() {
        let mut engine = engine(proportional_config());
        engine.attitude.rates = PerAxis::new(10.0, -10.0, 5.0);
        let first = engine.accro(0.0025).unwrap();
        let coefficient = engine.filter().coefficient();

        let frozen = engine.accro(0.0).unwrap();

        assert_eq!(first, frozen);
        assert_eq!(coefficient, engine.filter().coefficient());
        assert_eq!(1, engine.diagnostics().invalid_sample_ticks);
    }

    /// Inverted motor bounds are rejected at construction.
    #[test]
    fn test_inverted_motor_bounds_rejected() {
        let mut motors = MockMotors::new();
        motors.min_power = 2000;
        motors.max_power = 1000;

        let result = Engine::quad_x(
            proportional_config(),
            MockAttitude::calibrated(),
            MockCommands::flying(Mode::Accro, 1000),
            motors,
        );

        assert!(matches!(
            result,
            Err(StabilizationError::InvalidMotorBounds { min: 2000, max: 1000 })
        ));
    }

    #[test]
    fn test_reconfigure_resets_loops() {
        let mut engine = engine(integrating_config());
        engine.commands.demand = PerAxis::new(0.5, 0.0, 0.0);
        for _ in 0..10 {
            engine.accro(0.0025).unwrap();
        }

        let mut config = integrating_config();
        config.accro_rate.roll.kp = 2.0;
        engine.reconfigure(config).unwrap();

        assert!(value_close(0.0, engine.accro.roll.integral()));
        assert!(value_close(2.0, engine.config().accro_rate.roll.kp));

        config.filter_time_constant = -1.0;
        assert_eq!(
            Err(StabilizationError::InvalidTimeConstant),
            engine.reconfigure(config)
        );
    }

    #[test]
    fn test_motor_queries_pass_through() {
        let mut engine = engine(proportional_config());

        assert_eq!(MOCK_MAX_POWER, engine.motors_max_power());
        assert_eq!(MOCK_MIN_POWER, engine.motors_min_power());
        assert_eq!(MOCK_MAX_THROTTLE, engine.motors_max_throttle());
        assert_eq!(MOCK_MAX_THROTTLE_PERCENT, engine.motors_max_throttle_percent());
        assert_eq!(MOCK_IDLE_THRESHOLD, engine.motors_idle_threshold());
        assert_eq!(Mode::Accro, engine.flying_mode());
        assert_eq!(MOCK_MAX_THROTTLE, engine.throttle());
        assert!(!engine.is_throttle_idle());

        engine.attach_motors_timer(7);
        assert_eq!(Some(7), engine.motors().timer);
    }

    #[test]
    fn test_parameter_dumps() {
        let engine = engine(proportional_config());
        let mut text = TextBuffer::new();

        engine.write_accro_parameters(&mut text).unwrap();
        assert!(text.as_str().contains("Accro mode parameters"));
        assert!(text.as_str().contains("max rate 100 deg/s"));

        text.clear();
        engine.write_angle_parameters(&mut text).unwrap();
        assert!(text.as_str().contains("Angle mode parameters"));
        assert!(text.as_str().contains("Kp=2"));
    }
}
