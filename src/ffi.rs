//! C ABI of the platform sensor API.
//!
//! One registry per process, loaded on first access from the script named by
//! `$UBUNTU_PLATFORM_API_SENSOR_TEST`. Handles are opaque pointers to records of
//! that registry and stay valid until the process exits. Errors in the
//! declarations are fatal: they are logged, passed to the fatal hook, and the
//! process aborts. Event lines after the declarations never are.

use crate::config::Config;
use crate::error::{Result, SensorError};
use crate::registry::SensorRegistry;
use crate::script::ScriptReader;
use crate::sensors::{ProximityDistance, ReadingCallback, SensorRecord, SensorType, UStatus};
use crate::simulation::EventPlayer;
use log::{error, info, warn};
use parking_lot::{Mutex, RwLock, const_rwlock};
use std::ffi::c_void;
use std::ptr;
use std::sync::{Arc, OnceLock};

/// `void (*)(event, context)` as declared by the platform headers.
pub type OnSensorEventCb = Option<unsafe extern "C" fn(event: *mut c_void, context: *mut c_void)>;

struct Backend {
    registry: SensorRegistry,
    player: Mutex<Option<EventPlayer>>,
}

static BACKEND: OnceLock<Backend> = OnceLock::new();
static FATAL_HOOK: RwLock<Option<fn(&SensorError)>> = const_rwlock(None);

/// Install a hook that sees fatal script errors before the process aborts.
pub fn set_fatal_hook(hook: fn(&SensorError)) {
    *FATAL_HOOK.write() = Some(hook);
}

fn fatal(err: &SensorError) -> ! {
    error!("TestSensor ERROR: {}", err);
    eprintln!("TestSensor ERROR: {}", err);
    if let Some(hook) = *FATAL_HOOK.read() {
        hook(err);
    }
    std::process::abort();
}

impl Backend {
    fn load() -> Result<Self> {
        let config = Config::from_env();
        let path = config.require_script_path()?;
        let mut script = ScriptReader::open(path)?;
        let registry = SensorRegistry::from_script(&mut script)?;

        // Lines after the declarations are only read when playback is on,
        // and a bad one disables playback instead of failing the load.
        let player = if config.playback {
            match EventPlayer::from_script(&mut script, &registry) {
                Ok(player) if !player.is_empty() => Some(player),
                Ok(_) => None,
                Err(err) => {
                    warn!("Sensor event playback disabled: {}", err);
                    None
                }
            }
        } else {
            None
        };

        Ok(Self {
            registry,
            player: Mutex::new(player),
        })
    }
}

/// The process-wide registry, loading it on first use.
pub fn registry() -> &'static SensorRegistry {
    let backend = BACKEND.get_or_init(|| Backend::load().unwrap_or_else(|err| fatal(&err)));

    if let Some(player) = backend.player.lock().take() {
        info!("Starting sensor event playback");
        if let Err(err) = player.spawn_thread(&backend.registry) {
            fatal(&SensorError::IoError(err));
        }
    }
    &backend.registry
}

fn handle(sensor_type: SensorType) -> *mut c_void {
    registry()
        .get(sensor_type)
        .map_or(ptr::null_mut(), |record| {
            record as *const SensorRecord as *mut c_void
        })
}

/// # Safety
/// `handle` must be a non-null pointer returned by one of the `*_new` functions.
unsafe fn record<'a>(handle: *mut c_void) -> &'a SensorRecord {
    // SAFETY: handles point into the 'static registry
    unsafe { &*(handle as *const SensorRecord) }
}

/// Context pointer handed back to the host callback untouched.
#[derive(Clone, Copy)]
struct CallbackContext(*mut c_void);

// SAFETY: the pointer is opaque to us; thread-safety of its target is the host's contract.
unsafe impl Send for CallbackContext {}
unsafe impl Sync for CallbackContext {}

impl CallbackContext {
    fn get(self) -> *mut c_void {
        self.0
    }
}

unsafe fn set_reading_cb(handle: *mut c_void, cb: OnSensorEventCb, ctx: *mut c_void) {
    let sensor = unsafe { record(handle) };
    match cb {
        Some(cb) => {
            let ctx = CallbackContext(ctx);
            let callback: ReadingCallback = Arc::new(move |event: &SensorRecord| {
                let event = event as *const SensorRecord as *mut c_void;
                // SAFETY: the host registered this function for this event type
                unsafe { cb(event, ctx.get()) }
            });
            sensor.set_reading_cb(callback);
        }
        None => sensor.clear_reading_cb(),
    }
}

// Accelerometer handles

#[unsafe(no_mangle)]
pub extern "C" fn ua_sensors_accelerometer_new() -> *mut c_void {
    handle(SensorType::Accelerometer)
}

/// # Safety
/// `s` must be a non-null accelerometer handle.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn ua_sensors_accelerometer_enable(s: *mut c_void) -> UStatus {
    unsafe { record(s) }.set_enabled(true);
    UStatus::Success
}

/// # Safety
/// `s` must be a non-null accelerometer handle.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn ua_sensors_accelerometer_disable(s: *mut c_void) -> UStatus {
    unsafe { record(s) }.set_enabled(false);
    UStatus::Success
}

/// # Safety
/// `s` must be a non-null accelerometer handle.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn ua_sensors_accelerometer_get_min_delay(s: *mut c_void) -> u32 {
    unsafe { record(s) }.min_delay()
}

/// # Safety
/// `s` must be a non-null accelerometer handle.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn ua_sensors_accelerometer_get_min_value(s: *mut c_void) -> f32 {
    unsafe { record(s) }.min_value()
}

/// # Safety
/// `s` must be a non-null accelerometer handle.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn ua_sensors_accelerometer_get_max_value(s: *mut c_void) -> f32 {
    unsafe { record(s) }.max_value()
}

/// # Safety
/// `s` must be a non-null accelerometer handle.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn ua_sensors_accelerometer_get_resolution(s: *mut c_void) -> f32 {
    unsafe { record(s) }.resolution()
}

/// # Safety
/// `s` must be a non-null accelerometer handle.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn ua_sensors_accelerometer_set_reading_cb(
    s: *mut c_void,
    cb: OnSensorEventCb,
    ctx: *mut c_void,
) {
    unsafe { set_reading_cb(s, cb, ctx) }
}

/// # Safety
/// `e` must be an event pointer passed to an accelerometer callback, or a handle.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn uas_accelerometer_event_get_timestamp(e: *mut c_void) -> u64 {
    unsafe { record(e) }.timestamp()
}

/// # Safety
/// `e` must be an event pointer passed to an accelerometer callback, or a handle.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn uas_accelerometer_event_get_acceleration_x(e: *mut c_void) -> f32 {
    unsafe { record(e) }.reading().x
}

/// # Safety
/// `e` must be an event pointer passed to an accelerometer callback, or a handle.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn uas_accelerometer_event_get_acceleration_y(e: *mut c_void) -> f32 {
    unsafe { record(e) }.reading().y
}

/// # Safety
/// `e` must be an event pointer passed to an accelerometer callback, or a handle.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn uas_accelerometer_event_get_acceleration_z(e: *mut c_void) -> f32 {
    unsafe { record(e) }.reading().z
}

// Proximity handles

#[unsafe(no_mangle)]
pub extern "C" fn ua_sensors_proximity_new() -> *mut c_void {
    handle(SensorType::Proximity)
}

/// # Safety
/// `s` must be a non-null proximity handle.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn ua_sensors_proximity_enable(s: *mut c_void) -> UStatus {
    unsafe { record(s) }.set_enabled(true);
    UStatus::Success
}

/// # Safety
/// `s` must be a non-null proximity handle.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn ua_sensors_proximity_disable(s: *mut c_void) -> UStatus {
    unsafe { record(s) }.set_enabled(false);
    UStatus::Success
}

/// # Safety
/// `s` must be a non-null proximity handle.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn ua_sensors_proximity_get_min_delay(s: *mut c_void) -> u32 {
    unsafe { record(s) }.min_delay()
}

// range queries make no sense for proximity; always zero
#[unsafe(no_mangle)]
pub extern "C" fn ua_sensors_proximity_get_min_value(_s: *mut c_void) -> f32 {
    0.0
}

#[unsafe(no_mangle)]
pub extern "C" fn ua_sensors_proximity_get_max_value(_s: *mut c_void) -> f32 {
    0.0
}

#[unsafe(no_mangle)]
pub extern "C" fn ua_sensors_proximity_get_resolution(_s: *mut c_void) -> f32 {
    0.0
}

/// # Safety
/// `s` must be a non-null proximity handle.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn ua_sensors_proximity_set_reading_cb(
    s: *mut c_void,
    cb: OnSensorEventCb,
    ctx: *mut c_void,
) {
    unsafe { set_reading_cb(s, cb, ctx) }
}

/// # Safety
/// `e` must be an event pointer passed to a proximity callback, or a handle.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn uas_proximity_event_get_timestamp(e: *mut c_void) -> u64 {
    unsafe { record(e) }.timestamp()
}

/// # Safety
/// `e` must be an event pointer passed to a proximity callback, or a handle.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn uas_proximity_event_get_distance(e: *mut c_void) -> ProximityDistance {
    unsafe { record(e) }.reading().distance
}

// Light handles

#[unsafe(no_mangle)]
pub extern "C" fn ua_sensors_light_new() -> *mut c_void {
    handle(SensorType::Light)
}

/// # Safety
/// `s` must be a non-null light handle.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn ua_sensors_light_enable(s: *mut c_void) -> UStatus {
    unsafe { record(s) }.set_enabled(true);
    UStatus::Success
}

/// # Safety
/// `s` must be a non-null light handle.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn ua_sensors_light_disable(s: *mut c_void) -> UStatus {
    unsafe { record(s) }.set_enabled(false);
    UStatus::Success
}

/// # Safety
/// `s` must be a non-null light handle.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn ua_sensors_light_get_min_delay(s: *mut c_void) -> u32 {
    unsafe { record(s) }.min_delay()
}

/// # Safety
/// `s` must be a non-null light handle.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn ua_sensors_light_get_min_value(s: *mut c_void) -> f32 {
    unsafe { record(s) }.min_value()
}

/// # Safety
/// `s` must be a non-null light handle.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn ua_sensors_light_get_max_value(s: *mut c_void) -> f32 {
    unsafe { record(s) }.max_value()
}

/// # Safety
/// `s` must be a non-null light handle.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn ua_sensors_light_get_resolution(s: *mut c_void) -> f32 {
    unsafe { record(s) }.resolution()
}

/// # Safety
/// `s` must be a non-null light handle.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn ua_sensors_light_set_reading_cb(
    s: *mut c_void,
    cb: OnSensorEventCb,
    ctx: *mut c_void,
) {
    unsafe { set_reading_cb(s, cb, ctx) }
}

/// # Safety
/// `e` must be an event pointer passed to a light callback, or a handle.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn uas_light_event_get_timestamp(e: *mut c_void) -> u64 {
    unsafe { record(e) }.timestamp()
}

/// # Safety
/// `e` must be an event pointer passed to a light callback, or a handle.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn uas_light_event_get_light(e: *mut c_void) -> f32 {
    unsafe { record(e) }.reading().x
}
