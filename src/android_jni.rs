//! JNI surface for the Android app.
//!
//! Java keeps an opaque `long` handle per piano view and must call every function for a
//! handle from the UI thread. Samples are played on the Java side: after each touch event
//! Java drains the keys to play with `takeNotes`. The queue is bounded; keys played while
//! it is full are dropped.

use std::sync::mpsc::Receiver;

use crate::notes::KeyIdx;
use crate::session::Session;
use crate::settings::Settings;
use crate::sound::ChannelSoundSet;
use crate::touch::{PointerId, PointerSample, TouchEvent, TouchPhase};

use jni::objects::{JClass, JFloatArray, JIntArray, JString};
use jni::sys::{jboolean, jfloat, jint, jlong, JNI_FALSE, JNI_TRUE};
use jni::JNIEnv;

// android.view.MotionEvent actions
const ACTION_DOWN: jint = 0;
const ACTION_UP: jint = 1;
const ACTION_MOVE: jint = 2;
const ACTION_CANCEL: jint = 3;
const ACTION_POINTER_DOWN: jint = 5;
const ACTION_POINTER_UP: jint = 6;

struct AndroidSession {
    session: Session,
    notes: Receiver<KeyIdx>,
}

fn session_mut<'a>(handle: jlong) -> Option<&'a mut AndroidSession> {
    if handle == 0 {
        return None;
    }
    Some(unsafe { &mut *(handle as *mut AndroidSession) })
}

fn java_string(env: &mut JNIEnv, s: &JString) -> String {
    if s.is_null() {
        return String::new();
    }
    env.get_string(s).map(Into::into).unwrap_or_default()
}

fn melody_settings(env: &mut JNIEnv, enabled: jboolean, melodies: &JString) -> Settings {
    Settings {
        melodies_enabled: enabled != JNI_FALSE,
        selected_melodies: java_string(env, melodies)
            .split(',')
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .map(str::to_string)
            .collect(),
        ..Settings::default()
    }
}

fn touch_phase(action: jint) -> Option<TouchPhase> {
    match action {
        ACTION_DOWN | ACTION_POINTER_DOWN => Some(TouchPhase::Down),
        ACTION_MOVE => Some(TouchPhase::Move),
        ACTION_UP | ACTION_POINTER_UP => Some(TouchPhase::Up),
        ACTION_CANCEL => Some(TouchPhase::Cancel),
        _ => None,
    }
}

#[no_mangle]
pub extern "system" fn Java_com_nicobrailo_pianoli_NativePiano_create(
    mut env: JNIEnv,
    _class: JClass,
    width: jint,
    height: jint,
    sound_set: JString,
    melodies_enabled: jboolean,
    melodies: JString,
) -> jlong {
    let mut settings = melody_settings(&mut env, melodies_enabled, &melodies);
    settings.sound_set = java_string(&mut env, &sound_set);

    let (set, notes) = ChannelSoundSet::new(&settings.sound_set);
    let session = Session::new(
        width.max(0) as u32,
        height.max(0) as u32,
        &settings,
        Box::new(set),
    );
    Box::into_raw(Box::new(AndroidSession { session, notes })) as jlong
}

#[no_mangle]
pub extern "system" fn Java_com_nicobrailo_pianoli_NativePiano_destroy(
    _env: JNIEnv,
    _class: JClass,
    handle: jlong,
) {
    if handle == 0 {
        return;
    }
    unsafe {
        drop(Box::from_raw(handle as *mut AndroidSession));
    }
}

/// Returns the `HostRequests` bits raised by the event.
#[no_mangle]
pub extern "system" fn Java_com_nicobrailo_pianoli_NativePiano_handleTouch(
    env: JNIEnv,
    _class: JClass,
    handle: jlong,
    action: jint,
    ids: JIntArray,
    xs: JFloatArray,
    ys: JFloatArray,
) -> jint {
    let Some(s) = session_mut(handle) else {
        return 0;
    };
    let Some(phase) = touch_phase(action) else {
        log::debug!("Ignoring MotionEvent action {action}");
        return 0;
    };

    let count = [
        env.get_array_length(&ids),
        env.get_array_length(&xs),
        env.get_array_length(&ys),
    ]
    .into_iter()
    .map(|len| len.unwrap_or(0).max(0) as usize)
    .min()
    .unwrap_or(0);

    let mut id_buf = vec![0 as jint; count];
    let mut x_buf = vec![0.0 as jfloat; count];
    let mut y_buf = vec![0.0 as jfloat; count];
    if env.get_int_array_region(&ids, 0, &mut id_buf).is_err()
        || env.get_float_array_region(&xs, 0, &mut x_buf).is_err()
        || env.get_float_array_region(&ys, 0, &mut y_buf).is_err()
    {
        log::error!("Can't read touch arrays from Java");
        return 0;
    }

    let pointers = (0..count)
        .map(|i| PointerSample {
            id: PointerId(id_buf[i] as u32 as u64),
            x: x_buf[i],
            y: y_buf[i],
        })
        .collect();

    s.session
        .handle_touch(&TouchEvent { phase, pointers })
        .bits() as jint
}

/// Copies the keys played since the last call into `out`; returns how many were copied.
/// Keys that don't fit stay queued for the next call.
#[no_mangle]
pub extern "system" fn Java_com_nicobrailo_pianoli_NativePiano_takeNotes(
    env: JNIEnv,
    _class: JClass,
    handle: jlong,
    out: JIntArray,
) -> jint {
    let Some(s) = session_mut(handle) else {
        return 0;
    };
    let room = env.get_array_length(&out).unwrap_or(0).max(0) as usize;
    let keys: Vec<jint> = s.notes.try_iter().take(room).map(|k| k.0).collect();
    if env.set_int_array_region(&out, 0, &keys).is_err() {
        log::error!("Can't hand {} notes back to Java", keys.len());
        return 0;
    }
    keys.len() as jint
}

#[no_mangle]
pub extern "system" fn Java_com_nicobrailo_pianoli_NativePiano_resize(
    _env: JNIEnv,
    _class: JClass,
    handle: jlong,
    width: jint,
    height: jint,
) {
    if let Some(s) = session_mut(handle) {
        s.session.resize(width.max(0) as u32, height.max(0) as u32);
    }
}

#[no_mangle]
pub extern "system" fn Java_com_nicobrailo_pianoli_NativePiano_setSoundSet(
    mut env: JNIEnv,
    _class: JClass,
    handle: jlong,
    name: JString,
) {
    let name = java_string(&mut env, &name);
    if let Some(s) = session_mut(handle) {
        let (set, notes) = ChannelSoundSet::new(&name);
        s.session.set_sound_set(Box::new(set));
        s.notes = notes;
    }
}

#[no_mangle]
pub extern "system" fn Java_com_nicobrailo_pianoli_NativePiano_applyMelodySettings(
    mut env: JNIEnv,
    _class: JClass,
    handle: jlong,
    enabled: jboolean,
    melodies: JString,
) {
    let settings = melody_settings(&mut env, enabled, &melodies);
    if let Some(s) = session_mut(handle) {
        s.session.apply_melody_settings(&settings);
    }
}

#[no_mangle]
pub extern "system" fn Java_com_nicobrailo_pianoli_NativePiano_resetState(
    _env: JNIEnv,
    _class: JClass,
    handle: jlong,
) {
    if let Some(s) = session_mut(handle) {
        s.session.reset_state();
    }
}

#[no_mangle]
pub extern "system" fn Java_com_nicobrailo_pianoli_NativePiano_isKeyPressed(
    _env: JNIEnv,
    _class: JClass,
    handle: jlong,
    key: jint,
) -> jboolean {
    match session_mut(handle) {
        Some(s) if s.session.is_key_pressed(KeyIdx(key)) => JNI_TRUE,
        _ => JNI_FALSE,
    }
}

#[no_mangle]
pub extern "system" fn Java_com_nicobrailo_pianoli_NativePiano_resolveKey(
    _env: JNIEnv,
    _class: JClass,
    handle: jlong,
    x: jfloat,
    y: jfloat,
) -> jint {
    session_mut(handle).map_or(-1, |s| s.session.resolve_key(x, y).0)
}

#[no_mangle]
pub extern "system" fn Java_com_nicobrailo_pianoli_NativePiano_keysCount(
    _env: JNIEnv,
    _class: JClass,
    handle: jlong,
) -> jint {
    session_mut(handle).map_or(0, |s| s.session.keys_count() as jint)
}

#[no_mangle]
pub extern "system" fn Java_com_nicobrailo_pianoli_NativePiano_nextExpectedConfigKey(
    _env: JNIEnv,
    _class: JClass,
    handle: jlong,
) -> jint {
    session_mut(handle).map_or(-1, |s| s.session.next_expected_config_key().0)
}

/// Held unlock keys as a bitmask; bit `n` is key `n`.
#[no_mangle]
pub extern "system" fn Java_com_nicobrailo_pianoli_NativePiano_pressedConfigKeys(
    _env: JNIEnv,
    _class: JClass,
    handle: jlong,
) -> jint {
    session_mut(handle).map_or(0, |s| s.session.pressed_config_keys().bits() as jint)
}
