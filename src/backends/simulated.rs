// SPDX-License-Identifier: GPL-3.0-only

//! In-process simulated hardware
//!
//! Every collaborator trait has a simulated implementation here. They keep
//! call logs so tests can assert on the exact device traffic, and let tests
//! decide when asynchronous hardware work (photo delivery, movie
//! finalization) completes.

use super::Collaborators;
use super::camera::worker::{LoopAction, WorkerLoop};
use super::camera::*;
use super::motion::{Acceleration, MotionHandler, MotionSensor, SensorError};
use super::permissions::{PermissionGate, PermissionKind, PermissionStatus};
use super::render::{DrawTiming, GpuRenderer, RenderRequest};
use super::surface::{UiRotation, UiSurface, ViewEffect};
use crate::storage::{MediaLibrary, MediaStorage};
use futures::FutureExt;
use futures::future::BoxFuture;
use image::{Rgba, RgbaImage};
use std::collections::{HashMap, HashSet, VecDeque};
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::{Duration, Instant};
use tracing::{debug, info};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// A call made against the simulated capture provider
#[derive(Debug, Clone, PartialEq)]
pub enum ProviderCall {
    Lock(DeviceId),
    Unlock(DeviceId),
    SetZoom(f64),
    SetExposureMode(ExposureMode),
    SetCustomExposure(Duration, f32),
    SetExposureBias(f32),
    SetHdr(HdrMode),
    SetFrameDuration(Duration, Duration),
    SetTorch(TorchMode),
    SetPointOfInterest(FocusPoint),
    AddInput(DeviceId),
    RemoveInput(DeviceId),
    AddOutput(OutputType),
    RemoveOutput(OutputType),
    SetResolution(ResolutionPreset),
    SetFrameHandler(bool),
    StartSession,
    StopSession,
    CapturePhoto(PhotoSettings),
    StartRecording(PathBuf),
    StopRecording,
}

impl ProviderCall {
    /// Calls that touch a device or the session (everything except handler wiring)
    pub fn is_device_call(&self) -> bool {
        !matches!(self, ProviderCall::SetFrameHandler(_))
    }
}

/// Hardware-side state of one simulated device
#[derive(Debug, Clone, PartialEq)]
pub struct SimulatedDeviceState {
    pub zoom_factor: f64,
    pub exposure: ExposureSettings,
    pub hdr_mode: HdrMode,
    pub min_frame_duration: Duration,
    pub max_frame_duration: Duration,
    pub torch: TorchMode,
    pub point_of_interest: Option<FocusPoint>,
}

impl SimulatedDeviceState {
    fn new(capabilities: &DeviceCapabilities) -> Self {
        let frame_duration = Duration::from_secs_f64(1.0 / 30.0);
        Self {
            zoom_factor: capabilities.min_zoom,
            exposure: ExposureSettings::default(),
            hdr_mode: HdrMode::default(),
            min_frame_duration: frame_duration,
            max_frame_duration: frame_duration,
            torch: TorchMode::Off,
            point_of_interest: None,
        }
    }
}

struct ActiveRecording {
    path: PathBuf,
    done: RecordingCompletion,
    stopped: bool,
}

#[derive(Default)]
struct CameraState {
    calls: Vec<ProviderCall>,
    devices: HashMap<DeviceId, SimulatedDeviceState>,
    locked: HashSet<DeviceId>,
    inputs: Vec<DeviceId>,
    outputs: Vec<OutputType>,
    resolution: Option<ResolutionPreset>,
    running: bool,
    frame_handler: Option<FrameHandler>,
    pending_photos: VecDeque<PhotoCompletion>,
    recording: Option<ActiveRecording>,
    lock_failure: bool,
    fail_next_configuration: bool,
    reject_input: bool,
    start_failure: bool,
    manual_completion: bool,
}

/// Simulated capture session with front/back cameras and a microphone
pub struct SimulatedCamera {
    devices: Vec<(DeviceInfo, DeviceCapabilities)>,
    state: Mutex<CameraState>,
    sequence: AtomicU64,
    started_at: Instant,
    frame_source: Mutex<Option<WorkerLoop>>,
}

impl SimulatedCamera {
    /// Camera with the standard back, front and microphone devices
    pub fn new() -> Self {
        Self::with_devices(vec![
            Self::back_camera(),
            Self::front_camera(),
            Self::microphone(),
        ])
    }

    pub fn with_devices(devices: Vec<(DeviceInfo, DeviceCapabilities)>) -> Self {
        let state = CameraState {
            devices: devices
                .iter()
                .map(|(info, caps)| (info.id.clone(), SimulatedDeviceState::new(caps)))
                .collect(),
            ..Default::default()
        };
        Self {
            devices,
            state: Mutex::new(state),
            sequence: AtomicU64::new(0),
            started_at: Instant::now(),
            frame_source: Mutex::new(None),
        }
    }

    /// Wide back camera with every control available
    pub fn back_camera() -> (DeviceInfo, DeviceCapabilities) {
        (
            DeviceInfo {
                id: DeviceId::new("sim-back"),
                name: "Simulated Back Camera".to_string(),
                kind: DeviceKind::Camera(CameraPosition::Back),
            },
            DeviceCapabilities {
                min_zoom: 1.0,
                max_zoom: 10.0,
                min_exposure_duration: Duration::from_micros(125),
                max_exposure_duration: Duration::from_millis(500),
                min_iso: 50.0,
                max_iso: 3200.0,
                min_exposure_bias: -8.0,
                max_exposure_bias: 8.0,
                exposure_modes: vec![
                    ExposureMode::Locked,
                    ExposureMode::AutoExpose,
                    ExposureMode::ContinuousAuto,
                    ExposureMode::Custom,
                ],
                frame_rate_ranges: vec![FrameRateRange::new(1.0, 60.0)],
                has_flash: true,
                has_torch: true,
                supports_hdr: true,
                supports_focus_point: true,
            },
        )
    }

    /// Front camera without flash or torch, capped at 30 fps
    pub fn front_camera() -> (DeviceInfo, DeviceCapabilities) {
        (
            DeviceInfo {
                id: DeviceId::new("sim-front"),
                name: "Simulated Front Camera".to_string(),
                kind: DeviceKind::Camera(CameraPosition::Front),
            },
            DeviceCapabilities {
                min_zoom: 1.0,
                max_zoom: 2.0,
                min_exposure_duration: Duration::from_micros(250),
                max_exposure_duration: Duration::from_millis(250),
                min_iso: 25.0,
                max_iso: 1600.0,
                min_exposure_bias: -4.0,
                max_exposure_bias: 4.0,
                exposure_modes: vec![
                    ExposureMode::Locked,
                    ExposureMode::ContinuousAuto,
                    ExposureMode::Custom,
                ],
                frame_rate_ranges: vec![FrameRateRange::new(1.0, 30.0)],
                has_flash: false,
                has_torch: false,
                supports_hdr: true,
                supports_focus_point: true,
            },
        )
    }

    /// Front camera offering only continuous auto exposure
    pub fn fixed_exposure_camera() -> (DeviceInfo, DeviceCapabilities) {
        let (mut info, mut caps) = Self::front_camera();
        info.id = DeviceId::new("sim-fixed");
        info.name = "Simulated Fixed-Exposure Camera".to_string();
        caps.exposure_modes = vec![ExposureMode::ContinuousAuto];
        caps.supports_hdr = false;
        caps.supports_focus_point = false;
        (info, caps)
    }

    pub fn microphone() -> (DeviceInfo, DeviceCapabilities) {
        (
            DeviceInfo {
                id: DeviceId::new("sim-mic"),
                name: "Simulated Microphone".to_string(),
                kind: DeviceKind::Microphone,
            },
            DeviceCapabilities::none(),
        )
    }

    fn record(&self, call: ProviderCall) {
        lock(&self.state).calls.push(call);
    }

    // ===== Test controls =====

    pub fn calls(&self) -> Vec<ProviderCall> {
        lock(&self.state).calls.clone()
    }

    pub fn clear_calls(&self) {
        lock(&self.state).calls.clear();
    }

    pub fn device_state(&self, device: &DeviceId) -> SimulatedDeviceState {
        lock(&self.state)
            .devices
            .get(device)
            .cloned()
            .unwrap_or_else(|| SimulatedDeviceState::new(&DeviceCapabilities::none()))
    }

    pub fn is_locked(&self, device: &DeviceId) -> bool {
        lock(&self.state).locked.contains(device)
    }

    pub fn inputs(&self) -> Vec<DeviceId> {
        lock(&self.state).inputs.clone()
    }

    pub fn outputs(&self) -> Vec<OutputType> {
        lock(&self.state).outputs.clone()
    }

    pub fn has_frame_handler(&self) -> bool {
        lock(&self.state).frame_handler.is_some()
    }

    /// Make `lock_for_configuration` fail with `DeviceBusy`
    pub fn set_lock_failure(&self, fail: bool) {
        lock(&self.state).lock_failure = fail;
    }

    /// Make the next configuration setter fail
    pub fn fail_next_configuration(&self) {
        lock(&self.state).fail_next_configuration = true;
    }

    pub fn set_reject_input(&self, reject: bool) {
        lock(&self.state).reject_input = reject;
    }

    pub fn set_start_failure(&self, fail: bool) {
        lock(&self.state).start_failure = fail;
    }

    /// Hold photo and recording completions until the test releases them
    pub fn set_manual_completion(&self, manual: bool) {
        lock(&self.state).manual_completion = manual;
    }

    pub fn pending_photos(&self) -> usize {
        lock(&self.state).pending_photos.len()
    }

    pub fn is_recording(&self) -> bool {
        lock(&self.state)
            .recording
            .as_ref()
            .is_some_and(|recording| !recording.stopped)
    }

    /// Deliver the oldest pending photo; returns false when none is pending
    pub fn finish_photo(&self, result: BackendResult<Arc<RgbaImage>>) -> bool {
        let done = lock(&self.state).pending_photos.pop_front();
        match done {
            Some(done) => {
                done(result);
                true
            }
            None => false,
        }
    }

    /// Finalize the active recording; returns false when nothing is recording
    pub fn finish_recording(&self, error: Option<BackendError>) -> bool {
        let recording = lock(&self.state).recording.take();
        match recording {
            Some(recording) => {
                let result = match error {
                    Some(e) => Err(e),
                    None => Ok(recording.path),
                };
                (recording.done)(result);
                true
            }
            None => false,
        }
    }

    /// Deliver one frame to the installed handler; returns false without a handler
    pub fn emit_frame(&self, image: RgbaImage) -> bool {
        let handler = lock(&self.state).frame_handler.clone();
        let Some(handler) = handler else {
            return false;
        };
        let sequence = self.sequence.fetch_add(1, Ordering::SeqCst) + 1;
        handler(RawFrame {
            image: Arc::new(image),
            timestamp: self.started_at.elapsed(),
            sequence,
        });
        true
    }

    /// Synthetic gradient that shifts with the frame sequence
    pub fn test_pattern(width: u32, height: u32, sequence: u64) -> RgbaImage {
        RgbaImage::from_fn(width, height, |x, y| {
            let r = ((x as u64 * 255 / width.max(1) as u64 + sequence) % 256) as u8;
            let g = (y as u64 * 255 / height.max(1) as u64) as u8;
            let b = ((sequence * 8) % 256) as u8;
            Rgba([r, g, b, 255])
        })
    }

    /// Emit test pattern frames every `interval` while the session runs
    pub fn start_frame_source(self: &Arc<Self>, interval: Duration, width: u32, height: u32) {
        let camera: Weak<Self> = Arc::downgrade(self);
        let worker = WorkerLoop::start("simulated-frames", move || {
            let Some(camera) = camera.upgrade() else {
                return LoopAction::Stop;
            };
            if camera.is_running() {
                let sequence = camera.sequence.load(Ordering::SeqCst);
                camera.emit_frame(Self::test_pattern(width, height, sequence));
            }
            drop(camera);
            std::thread::sleep(interval);
            LoopAction::Continue
        });
        *lock(&self.frame_source) = Some(worker);
    }

    pub fn stop_frame_source(&self) {
        let worker = lock(&self.frame_source).take();
        if let Some(mut worker) = worker {
            worker.stop();
        }
    }

    fn still_image() -> Arc<RgbaImage> {
        Arc::new(Self::test_pattern(64, 48, 0))
    }
}

impl Default for SimulatedCamera {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for SimulatedCamera {
    fn drop(&mut self) {
        self.stop_frame_source();
    }
}

/// Configuration lock over a simulated device; unlocks on drop
struct SimulatedConfiguration<'a> {
    camera: &'a SimulatedCamera,
    device: DeviceId,
}

impl SimulatedConfiguration<'_> {
    fn mutate(
        &mut self,
        call: ProviderCall,
        apply: impl FnOnce(&mut SimulatedDeviceState),
    ) -> BackendResult<()> {
        let mut state = lock(&self.camera.state);
        state.calls.push(call);
        if std::mem::take(&mut state.fail_next_configuration) {
            return Err(BackendError::Other("simulated configuration failure".to_string()));
        }
        if let Some(device) = state.devices.get_mut(&self.device) {
            apply(device);
        }
        Ok(())
    }
}

impl DeviceConfiguration for SimulatedConfiguration<'_> {
    fn set_zoom_factor(&mut self, factor: f64) -> BackendResult<()> {
        self.mutate(ProviderCall::SetZoom(factor), |d| d.zoom_factor = factor)
    }

    fn set_exposure_mode(&mut self, mode: ExposureMode) -> BackendResult<()> {
        self.mutate(ProviderCall::SetExposureMode(mode), |d| d.exposure.mode = mode)
    }

    fn set_custom_exposure(&mut self, duration: Duration, iso: f32) -> BackendResult<()> {
        self.mutate(ProviderCall::SetCustomExposure(duration, iso), |d| {
            d.exposure.duration = duration;
            d.exposure.iso = iso;
            d.exposure.mode = ExposureMode::Custom;
        })
    }

    fn set_exposure_target_bias(&mut self, bias: f32) -> BackendResult<()> {
        self.mutate(ProviderCall::SetExposureBias(bias), |d| d.exposure.target_bias = bias)
    }

    fn set_hdr_mode(&mut self, mode: HdrMode) -> BackendResult<()> {
        self.mutate(ProviderCall::SetHdr(mode), |d| d.hdr_mode = mode)
    }

    fn set_frame_duration(&mut self, min: Duration, max: Duration) -> BackendResult<()> {
        self.mutate(ProviderCall::SetFrameDuration(min, max), |d| {
            d.min_frame_duration = min;
            d.max_frame_duration = max;
        })
    }

    fn set_torch_mode(&mut self, mode: TorchMode) -> BackendResult<()> {
        self.mutate(ProviderCall::SetTorch(mode), |d| d.torch = mode)
    }

    fn set_point_of_interest(&mut self, point: FocusPoint) -> BackendResult<()> {
        self.mutate(ProviderCall::SetPointOfInterest(point), |d| {
            d.point_of_interest = Some(point)
        })
    }
}

impl Drop for SimulatedConfiguration<'_> {
    fn drop(&mut self) {
        let mut state = lock(&self.camera.state);
        state.locked.remove(&self.device);
        state.calls.push(ProviderCall::Unlock(self.device.clone()));
    }
}

impl CaptureProvider for SimulatedCamera {
    fn list_devices(&self) -> Vec<DeviceInfo> {
        self.devices.iter().map(|(info, _)| info.clone()).collect()
    }

    fn capabilities(&self, device: &DeviceInfo) -> BackendResult<DeviceCapabilities> {
        self.devices
            .iter()
            .find(|(info, _)| info.id == device.id)
            .map(|(_, caps)| caps.clone())
            .ok_or_else(|| BackendError::NotAvailable(device.id.to_string()))
    }

    fn lock_for_configuration(&self, device: &DeviceId) -> BackendResult<ConfigurationLock<'_>> {
        let mut state = lock(&self.state);
        if state.lock_failure {
            return Err(BackendError::DeviceBusy("simulated lock failure".to_string()));
        }
        if !state.locked.insert(device.clone()) {
            return Err(BackendError::DeviceBusy(format!("{} already locked", device)));
        }
        state.calls.push(ProviderCall::Lock(device.clone()));
        drop(state);

        Ok(Box::new(SimulatedConfiguration {
            camera: self,
            device: device.clone(),
        }))
    }

    fn add_input(&self, device: &DeviceId) -> BackendResult<()> {
        let mut state = lock(&self.state);
        state.calls.push(ProviderCall::AddInput(device.clone()));
        if state.reject_input {
            return Err(BackendError::InputRejected(device.to_string()));
        }
        if !state.devices.contains_key(device) {
            return Err(BackendError::NotAvailable(device.to_string()));
        }
        state.inputs.push(device.clone());
        Ok(())
    }

    fn remove_input(&self, device: &DeviceId) {
        let mut state = lock(&self.state);
        state.calls.push(ProviderCall::RemoveInput(device.clone()));
        state.inputs.retain(|d| d != device);
    }

    fn add_output(&self, output: OutputType) -> BackendResult<()> {
        let mut state = lock(&self.state);
        state.calls.push(ProviderCall::AddOutput(output));
        if state.outputs.contains(&output) {
            return Err(BackendError::OutputRejected(format!("{} output already attached", output)));
        }
        state.outputs.push(output);
        Ok(())
    }

    fn remove_output(&self, output: OutputType) {
        let mut state = lock(&self.state);
        state.calls.push(ProviderCall::RemoveOutput(output));
        state.outputs.retain(|o| *o != output);
    }

    fn set_resolution(&self, preset: ResolutionPreset) -> BackendResult<()> {
        let mut state = lock(&self.state);
        state.calls.push(ProviderCall::SetResolution(preset));
        state.resolution = Some(preset);
        Ok(())
    }

    fn set_frame_handler(&self, handler: Option<FrameHandler>) {
        let mut state = lock(&self.state);
        state.calls.push(ProviderCall::SetFrameHandler(handler.is_some()));
        state.frame_handler = handler;
    }

    fn start_session(&self) -> BackendResult<()> {
        let mut state = lock(&self.state);
        state.calls.push(ProviderCall::StartSession);
        if state.start_failure {
            return Err(BackendError::Other("simulated start failure".to_string()));
        }
        state.running = true;
        info!(inputs = state.inputs.len(), outputs = state.outputs.len(), "Simulated session running");
        Ok(())
    }

    fn stop_session(&self) {
        let mut state = lock(&self.state);
        state.calls.push(ProviderCall::StopSession);
        state.running = false;
    }

    fn is_running(&self) -> bool {
        lock(&self.state).running
    }

    fn capture_photo(&self, settings: PhotoSettings, done: PhotoCompletion) {
        let mut state = lock(&self.state);
        state.calls.push(ProviderCall::CapturePhoto(settings));
        if state.manual_completion {
            state.pending_photos.push_back(done);
            return;
        }
        drop(state);
        debug!(?settings, "Simulated photo delivered");
        done(Ok(Self::still_image()));
    }

    fn start_recording(&self, path: PathBuf, done: RecordingCompletion) -> BackendResult<()> {
        let mut state = lock(&self.state);
        state.calls.push(ProviderCall::StartRecording(path.clone()));
        if state.recording.is_some() {
            return Err(BackendError::RecordingInProgress);
        }
        state.recording = Some(ActiveRecording {
            path,
            done,
            stopped: false,
        });
        Ok(())
    }

    fn stop_recording(&self) {
        let mut state = lock(&self.state);
        state.calls.push(ProviderCall::StopRecording);
        if state.manual_completion {
            if let Some(recording) = state.recording.as_mut() {
                recording.stopped = true;
            }
            return;
        }
        drop(state);
        self.finish_recording(None);
    }
}

/// Accelerometer fed by the test
#[derive(Default)]
pub struct ScriptedMotion {
    handler: Mutex<Option<MotionHandler>>,
    interval: Mutex<Option<Duration>>,
    unavailable: Mutex<bool>,
}

impl ScriptedMotion {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_unavailable(&self, unavailable: bool) {
        *lock(&self.unavailable) = unavailable;
    }

    pub fn is_active(&self) -> bool {
        lock(&self.handler).is_some()
    }

    pub fn interval(&self) -> Option<Duration> {
        *lock(&self.interval)
    }

    /// Deliver a sample; returns false when updates are stopped
    pub fn push(&self, x: f64, y: f64, z: f64) -> bool {
        self.deliver(Ok(Acceleration::new(x, y, z)))
    }

    pub fn push_error(&self, error: SensorError) -> bool {
        self.deliver(Err(error))
    }

    fn deliver(&self, sample: Result<Acceleration, SensorError>) -> bool {
        let handler = lock(&self.handler).clone();
        match handler {
            Some(handler) => {
                handler(sample);
                true
            }
            None => false,
        }
    }
}

impl MotionSensor for ScriptedMotion {
    fn start_updates(&self, interval: Duration, handler: MotionHandler) -> Result<(), SensorError> {
        if *lock(&self.unavailable) {
            return Err(SensorError::Unavailable);
        }
        *lock(&self.interval) = Some(interval);
        *lock(&self.handler) = Some(handler);
        Ok(())
    }

    fn stop_updates(&self) {
        lock(&self.handler).take();
    }
}

/// A draw as seen by [`RecordingRenderer`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DrawnFrame {
    pub sequence: u64,
    pub orientation: FrameOrientation,
}

/// Renderer that records every draw
#[derive(Default)]
pub struct RecordingRenderer {
    drawn: Mutex<Vec<DrawnFrame>>,
    draw_delay: Mutex<Duration>,
    releases: AtomicU64,
}

impl RecordingRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make each draw block for `delay`
    pub fn set_draw_delay(&self, delay: Duration) {
        *lock(&self.draw_delay) = delay;
    }

    pub fn drawn(&self) -> Vec<DrawnFrame> {
        lock(&self.drawn).clone()
    }

    pub fn releases(&self) -> u64 {
        self.releases.load(Ordering::SeqCst)
    }
}

impl GpuRenderer for RecordingRenderer {
    fn draw(&self, request: &RenderRequest) -> DrawTiming {
        let started = Instant::now();
        let delay = *lock(&self.draw_delay);
        if !delay.is_zero() {
            std::thread::sleep(delay);
        }
        lock(&self.drawn).push(DrawnFrame {
            sequence: request.frame.sequence,
            orientation: request.frame.orientation,
        });
        DrawTiming {
            duration: started.elapsed(),
        }
    }

    fn release(&self) {
        self.releases.fetch_add(1, Ordering::SeqCst);
    }
}

/// UI surface with a settable rotation and an effect log
#[derive(Default)]
pub struct RecordingSurface {
    rotation: Mutex<UiRotation>,
    effects: Mutex<Vec<ViewEffect>>,
    releases: AtomicU64,
}

impl RecordingSurface {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_rotation(&self, rotation: UiRotation) {
        *lock(&self.rotation) = rotation;
    }

    pub fn effects(&self) -> Vec<ViewEffect> {
        lock(&self.effects).clone()
    }

    pub fn clear_effects(&self) {
        lock(&self.effects).clear();
    }

    pub fn releases(&self) -> u64 {
        self.releases.load(Ordering::SeqCst)
    }
}

impl UiSurface for RecordingSurface {
    fn device_rotation(&self) -> UiRotation {
        *lock(&self.rotation)
    }

    fn apply(&self, effect: &ViewEffect) {
        lock(&self.effects).push(effect.clone());
    }

    fn release(&self) {
        self.releases.fetch_add(1, Ordering::SeqCst);
    }
}

/// Permission gate with scripted statuses and prompt answers
pub struct ScriptedPermissions {
    statuses: Mutex<HashMap<PermissionKind, PermissionStatus>>,
    answers: Mutex<HashMap<PermissionKind, PermissionStatus>>,
    requests: Mutex<Vec<PermissionKind>>,
}

impl ScriptedPermissions {
    /// Both permissions already granted
    pub fn granted() -> Self {
        Self::with_status(PermissionStatus::Granted, PermissionStatus::Granted)
    }

    pub fn with_status(camera: PermissionStatus, microphone: PermissionStatus) -> Self {
        let statuses = HashMap::from([
            (PermissionKind::Camera, camera),
            (PermissionKind::Microphone, microphone),
        ]);
        Self {
            statuses: Mutex::new(statuses),
            answers: Mutex::new(HashMap::new()),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn set_status(&self, kind: PermissionKind, status: PermissionStatus) {
        lock(&self.statuses).insert(kind, status);
    }

    /// What the user answers when prompted for `kind` (default: grant)
    pub fn answer(&self, kind: PermissionKind, status: PermissionStatus) {
        lock(&self.answers).insert(kind, status);
    }

    pub fn requests(&self) -> Vec<PermissionKind> {
        lock(&self.requests).clone()
    }
}

impl PermissionGate for ScriptedPermissions {
    fn status(&self, kind: PermissionKind) -> PermissionStatus {
        lock(&self.statuses)
            .get(&kind)
            .copied()
            .unwrap_or(PermissionStatus::Undetermined)
    }

    fn request(&self, kind: PermissionKind) -> BoxFuture<'static, PermissionStatus> {
        lock(&self.requests).push(kind);
        let answer = lock(&self.answers)
            .get(&kind)
            .copied()
            .unwrap_or(PermissionStatus::Granted);
        lock(&self.statuses).insert(kind, answer);
        futures::future::ready(answer).boxed()
    }
}

/// A full set of simulated collaborators
#[derive(Clone)]
pub struct SimulatedHardware {
    pub camera: Arc<SimulatedCamera>,
    pub motion: Arc<ScriptedMotion>,
    pub renderer: Arc<RecordingRenderer>,
    pub surface: Arc<RecordingSurface>,
    pub permissions: Arc<ScriptedPermissions>,
    pub storage: Arc<MediaLibrary>,
}

impl SimulatedHardware {
    /// Standard devices, granted permissions, portrait UI, temp media root
    pub fn new() -> Self {
        let surface = RecordingSurface::new();
        surface.set_rotation(UiRotation::Portrait);
        let root = std::env::temp_dir().join(format!("camera-session-{}", uuid::Uuid::new_v4()));
        Self {
            camera: Arc::new(SimulatedCamera::new()),
            motion: Arc::new(ScriptedMotion::new()),
            renderer: Arc::new(RecordingRenderer::new()),
            surface: Arc::new(surface),
            permissions: Arc::new(ScriptedPermissions::granted()),
            storage: Arc::new(MediaLibrary::with_root(root)),
        }
    }

    pub fn with_camera(mut self, camera: SimulatedCamera) -> Self {
        self.camera = Arc::new(camera);
        self
    }

    pub fn with_permissions(mut self, permissions: ScriptedPermissions) -> Self {
        self.permissions = Arc::new(permissions);
        self
    }

    pub fn with_storage(mut self, storage: MediaLibrary) -> Self {
        self.storage = Arc::new(storage);
        self
    }

    pub fn collaborators(&self) -> Collaborators {
        Collaborators {
            provider: self.camera.clone(),
            motion: self.motion.clone(),
            renderer: self.renderer.clone(),
            surface: self.surface.clone(),
            permissions: self.permissions.clone(),
            storage: self.storage.clone() as Arc<dyn MediaStorage>,
        }
    }
}

impl Default for SimulatedHardware {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_configuration_lock_is_not_reentrant() {
        let camera = SimulatedCamera::new();
        let id = DeviceId::new("sim-back");

        let held = camera.lock_for_configuration(&id).unwrap();
        assert!(matches!(
            camera.lock_for_configuration(&id),
            Err(BackendError::DeviceBusy(_))
        ));
        drop(held);

        assert!(!camera.is_locked(&id));
        assert!(camera.lock_for_configuration(&id).is_ok());
    }

    #[test]
    fn test_frames_need_a_handler() {
        let camera = SimulatedCamera::new();
        assert!(!camera.emit_frame(SimulatedCamera::test_pattern(4, 4, 0)));

        let seen = Arc::new(AtomicU64::new(0));
        let seen_clone = Arc::clone(&seen);
        camera.set_frame_handler(Some(Arc::new(move |frame: RawFrame| {
            seen_clone.store(frame.sequence, Ordering::SeqCst);
        })));

        assert!(camera.emit_frame(SimulatedCamera::test_pattern(4, 4, 0)));
        assert!(camera.emit_frame(SimulatedCamera::test_pattern(4, 4, 1)));
        assert_eq!(seen.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_manual_recording_completion() {
        let camera = SimulatedCamera::new();
        camera.set_manual_completion(true);

        let finished = Arc::new(Mutex::new(None));
        let sink = Arc::clone(&finished);
        camera
            .start_recording(
                PathBuf::from("/tmp/clip.mov"),
                Box::new(move |result| *sink.lock().unwrap() = Some(result)),
            )
            .unwrap();
        assert!(camera.is_recording());

        camera.stop_recording();
        assert!(!camera.is_recording());
        assert!(finished.lock().unwrap().is_none());

        assert!(camera.finish_recording(None));
        assert_eq!(
            *finished.lock().unwrap(),
            Some(Ok(PathBuf::from("/tmp/clip.mov")))
        );
    }

    #[test]
    fn test_motion_only_delivers_while_active() {
        let motion = ScriptedMotion::new();
        assert!(!motion.push(0.0, -1.0, 0.0));

        let count = Arc::new(AtomicU64::new(0));
        let count_clone = Arc::clone(&count);
        motion
            .start_updates(
                Duration::from_millis(100),
                Arc::new(move |_: Result<Acceleration, SensorError>| {
                    count_clone.fetch_add(1, Ordering::SeqCst);
                }),
            )
            .unwrap();
        assert!(motion.push(0.0, -1.0, 0.0));

        motion.stop_updates();
        assert!(!motion.push(0.0, -1.0, 0.0));
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_permission_prompt_updates_status() {
        let permissions = ScriptedPermissions::with_status(
            PermissionStatus::Undetermined,
            PermissionStatus::Granted,
        );
        permissions.answer(PermissionKind::Camera, PermissionStatus::Denied);

        let answer = futures::executor::block_on(permissions.request(PermissionKind::Camera));
        assert_eq!(answer, PermissionStatus::Denied);
        assert_eq!(permissions.status(PermissionKind::Camera), PermissionStatus::Denied);
        assert_eq!(permissions.requests(), vec![PermissionKind::Camera]);
    }
}
