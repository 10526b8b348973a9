//! In-memory hardware backend recording what the front-end asks of it

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use hevc_nvenc::engine::{
    DeviceInfo, EncodeError, Frame, HardwareBackend, HardwareSession, Packet, SessionParams,
};

#[derive(Debug, Default)]
pub struct BackendLog {
    /// Every device index `open` was called with, in order
    pub attempts: Vec<usize>,
    /// Successful opens
    pub opened: Vec<(usize, SessionParams)>,
    pub closed: usize,
}

/// Devices named `gpu0`, `gpu1`, ...; selected ones refuse every session.
#[derive(Clone)]
pub struct FakeBackend {
    devices: Vec<DeviceInfo>,
    rejecting: Vec<usize>,
    rejection: Option<String>,
    delay: usize,
    log: Arc<Mutex<BackendLog>>,
}

impl FakeBackend {
    pub fn with_devices(count: usize) -> Self {
        Self {
            devices: (0..count)
                .map(|i| DeviceInfo {
                    name: format!("gpu{}", i),
                    compute_capability: Some((7, 5)),
                })
                .collect(),
            rejecting: Vec::new(),
            rejection: None,
            delay: 0,
            log: Arc::new(Mutex::new(BackendLog::default())),
        }
    }

    /// `device` fails to open with a hardware error
    pub fn rejecting(mut self, device: usize) -> Self {
        self.rejecting.push(device);
        self
    }

    /// Every device refuses the configuration itself
    pub fn refusing_configuration(mut self, reason: &str) -> Self {
        self.rejection = Some(reason.to_string());
        self
    }

    /// Sessions hold back `frames` packets until drained
    pub fn with_delay(mut self, frames: usize) -> Self {
        self.delay = frames;
        self
    }

    pub fn attempts(&self) -> Vec<usize> {
        self.log.lock().unwrap().attempts.clone()
    }

    pub fn opened(&self) -> Vec<(usize, SessionParams)> {
        self.log.lock().unwrap().opened.clone()
    }

    pub fn closed(&self) -> usize {
        self.log.lock().unwrap().closed
    }

    pub fn shared(&self) -> Arc<dyn HardwareBackend> {
        Arc::new(self.clone())
    }
}

impl HardwareBackend for FakeBackend {
    fn devices(&self) -> Vec<DeviceInfo> {
        self.devices.clone()
    }

    fn open(
        &self,
        device: usize,
        params: &SessionParams,
    ) -> Result<Box<dyn HardwareSession>, EncodeError> {
        let mut log = self.log.lock().unwrap();
        log.attempts.push(device);

        if let Some(reason) = &self.rejection {
            return Err(EncodeError::UnsupportedCombination(reason.clone()));
        }
        if self.rejecting.contains(&device) {
            return Err(EncodeError::Hardware(format!("gpu{} is busy", device)));
        }

        log.opened.push((device, params.clone()));
        Ok(Box::new(FakeSession {
            pending: VecDeque::new(),
            delay: self.delay,
            log: Arc::clone(&self.log),
        }))
    }
}

struct FakeSession {
    pending: VecDeque<Packet>,
    delay: usize,
    log: Arc<Mutex<BackendLog>>,
}

impl HardwareSession for FakeSession {
    fn encode(&mut self, frame: Option<&Frame>) -> Result<Option<Packet>, EncodeError> {
        match frame {
            Some(frame) => {
                self.pending.push_back(Packet {
                    pts: frame.pts,
                    data: frame.data.clone(),
                    keyframe: frame.pts == 0,
                });
                if self.pending.len() > self.delay {
                    Ok(self.pending.pop_front())
                } else {
                    Ok(None)
                }
            }
            None => Ok(self.pending.pop_front()),
        }
    }

    fn close(&mut self) {
        self.log.lock().unwrap().closed += 1;
    }
}
