//! Scripted in-memory instrument for driver tests.
#![allow(dead_code)]

use std::{
    collections::VecDeque,
    sync::{Arc, Mutex},
    time::Duration,
};

use async_trait::async_trait;
use labinst_rs::{
    error::{Error, Result},
    protocol::Transport,
};

type Responder = Box<dyn FnMut(&str) -> Option<String> + Send>;

#[derive(Default)]
struct SimState {
    bytes_written: usize,
    lines: Vec<String>,
    pending: VecDeque<u8>,
    closed: bool,
    fail_disconnect: bool,
}

/// Inspection handle kept by the test after the instrument is moved into a
/// driver.
#[derive(Clone)]
pub struct SimHandle {
    state: Arc<Mutex<SimState>>,
}
impl SimHandle {
    /// Every command line received, without terminators
    pub fn lines(&self) -> Vec<String> {
        self.state.lock().unwrap().lines.clone()
    }

    pub fn count(&self, command: &str) -> usize {
        self.lines().iter().filter(|l| *l == command).count()
    }

    pub fn bytes_written(&self) -> usize {
        self.state.lock().unwrap().bytes_written
    }

    pub fn closed(&self) -> bool {
        self.state.lock().unwrap().closed
    }

    /// Make every later `disconnect` fail after closing.
    pub fn fail_disconnect(&self) {
        self.state.lock().unwrap().fail_disconnect = true;
    }
}

pub struct SimInstrument {
    state: Arc<Mutex<SimState>>,
    reply_terminator: Vec<u8>,
    responder: Responder,
}
impl SimInstrument {
    /// `responder` is called for every command line and may return a reply,
    /// which is queued with `reply_terminator` appended.
    pub fn new(
        reply_terminator: &[u8],
        responder: impl FnMut(&str) -> Option<String> + Send + 'static,
    ) -> (Box<dyn Transport>, SimHandle) {
        let state = Arc::new(Mutex::new(SimState::default()));
        let sim = Self {
            state: state.clone(),
            reply_terminator: reply_terminator.to_vec(),
            responder: Box::new(responder),
        };
        (Box::new(sim), SimHandle { state })
    }
}
#[async_trait]
impl Transport for SimInstrument {
    async fn int_send(&mut self, data: &[u8]) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        if state.closed {
            return Err(Error::Unspecified("closed".into()));
        }
        state.bytes_written += data.len();

        for line in String::from_utf8_lossy(data).split_terminator('\n') {
            let line = line.trim_end_matches('\r').to_string();
            if let Some(reply) = (self.responder)(&line) {
                state.pending.extend(reply.as_bytes());
                state.pending.extend(&self.reply_terminator);
            }
            state.lines.push(line);
        }
        Ok(())
    }

    async fn recv_until(&mut self, delimiter: &[u8], timeout: Duration) -> Result<Vec<u8>> {
        let line = {
            let mut state = self.state.lock().unwrap();
            let mut data = vec![];
            let mut found = false;
            while let Some(b) = state.pending.pop_front() {
                data.push(b);
                if data.ends_with(delimiter) {
                    found = true;
                    break;
                }
            }
            found.then_some(data)
        };

        match line {
            Some(line) => Ok(line),
            None => {
                tokio::time::sleep(timeout).await;
                Err(Error::Timeout(format!("no reply within {timeout:?}")))
            }
        }
    }

    async fn flush_rx(&mut self, _timeout: Duration) -> Result<()> {
        self.state.lock().unwrap().pending.clear();
        Ok(())
    }

    async fn disconnect(&mut self) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.closed = true;
        if state.fail_disconnect {
            return Err(Error::Unspecified("disconnect failed".into()));
        }
        Ok(())
    }
}

/// DLnsec-like responder. ERR? replies are taken from `errors` first, then
/// report success.
pub fn laser_responder(
    errors: Vec<&'static str>,
) -> impl FnMut(&str) -> Option<String> + Send + 'static {
    let mut errors: VecDeque<_> = errors.into();
    let mut power = 0u8;

    move |line| match line {
        "*IDN" => Some("DLnsec SN 20220222".into()),
        "ERR?" => Some(errors.pop_front().unwrap_or("0; No error").into()),
        "PWR?" => Some(power.to_string()),
        _ => {
            if let Some(p) = line.strip_prefix("PWR") {
                power = p.parse().unwrap_or(power);
            }
            None
        }
    }
}
