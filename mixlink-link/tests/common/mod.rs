//! Simulated host for exchange tests
//!
//! The display side runs the real [`Transport`] and [`MixerLink`]. Bytes the
//! transport flushes land on a shared wire that [`MockHost::serve`] reads;
//! replies go back through [`Transport::receive`], as the UART interrupt
//! would deliver them.

#![allow(dead_code)]

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::rc::Rc;

use embassy_futures::yield_now;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;

use mixlink_hal::SerialLink;
use mixlink_link::{LinkTiming, Transport};
use mixlink_protocol::commands::{
    ECHO, LOAD_ALL, QUERY_CHANGES, READ_IMG, RESPONSE_FAIL, RESPONSE_OK, SENTINEL_LEN, SET_MUTE,
    SET_VOLUME,
};
use mixlink_protocol::wire::{open, read_u32, seal, seal_u32};
use mixlink_protocol::{EntryHeader, ImageRequest, MuteFrame, Response, VolumeFrame, CHECKSUM_LEN};

pub type TestTransport = Transport<CriticalSectionRawMutex, WireLink, 256, 1024>;

/// Short budgets so timeouts resolve in milliseconds
pub const FAST: LinkTiming = LinkTiming {
    read_retries: 20,
    read_poll_ms: 1,
    write_retries: 3,
    write_retry_ms: 1,
};

/// Display → host byte stream
#[derive(Clone, Default)]
pub struct Wire(Rc<RefCell<VecDeque<u8>>>);

impl Wire {
    fn pop(&self) -> Option<u8> {
        self.0.borrow_mut().pop_front()
    }
}

/// Display's serial hardware: transmit appends to the wire
pub struct WireLink {
    wire: Wire,
    pub connected: Rc<Cell<bool>>,
}

impl SerialLink for WireLink {
    fn transmit(&mut self, data: &[u8]) -> usize {
        self.wire.0.borrow_mut().extend(data.iter().copied());
        data.len()
    }

    fn is_connected(&self) -> bool {
        self.connected.get()
    }
}

pub fn transport() -> (TestTransport, Wire) {
    let wire = Wire::default();
    let link = WireLink {
        wire: wire.clone(),
        connected: Rc::new(Cell::new(true)),
    };
    (Transport::new(link, FAST), wire)
}

/// Session the host reports
#[derive(Debug, Clone)]
pub struct HostSession {
    pub pid: i16,
    pub volume: u8,
    pub muted: bool,
    pub name: Vec<u8>,
}

impl HostSession {
    pub fn new(pid: i16, volume: u8, muted: bool, name: &str) -> Self {
        Self {
            pid,
            volume,
            muted,
            name: name.as_bytes().to_vec(),
        }
    }
}

/// Everything the host observed
#[derive(Debug, Default)]
pub struct HostLog {
    pub opcodes: Vec<u8>,
    pub sentinels: Vec<Response>,
    pub volumes: Vec<VolumeFrame>,
    pub mutes: Vec<MuteFrame>,
    pub echoes: Vec<Vec<u8>>,
    pub image_requests: Vec<i16>,
    pub chunk_size: Option<u32>,
    /// Length of every chunk sent
    pub chunks: Vec<usize>,
}

/// How the host misbehaves
#[derive(Debug, Default, Clone)]
pub struct Faults {
    /// Read commands but never answer
    pub silent: bool,
    /// Flip a bit in the header of this table entry
    pub corrupt_entry: Option<usize>,
    /// Flip a bit in this image chunk
    pub corrupt_chunk: Option<usize>,
    /// Answer a poll with only this many bytes
    pub truncate_poll: Option<usize>,
    /// Flip a bit in the poll reply's flag byte after sealing it
    pub corrupt_poll: bool,
    /// Report this many entries instead of the real count
    pub count_override: Option<u8>,
}

pub struct MockHost<'t> {
    transport: &'t TestTransport,
    wire: Wire,
    pub sessions: Vec<HostSession>,
    pub images: Vec<(i16, Vec<u8>)>,
    /// Flag byte answered to QUERY_CHANGES
    pub change_flag: u8,
    pub faults: Faults,
    pub log: RefCell<HostLog>,
}

impl<'t> MockHost<'t> {
    pub fn new(transport: &'t TestTransport, wire: Wire) -> Self {
        Self {
            transport,
            wire,
            sessions: Vec::new(),
            images: Vec::new(),
            change_flag: 1,
            faults: Faults::default(),
            log: RefCell::new(HostLog::default()),
        }
    }

    async fn next_byte(&self) -> u8 {
        loop {
            if let Some(byte) = self.wire.pop() {
                return byte;
            }
            yield_now().await;
        }
    }

    async fn next_bytes(&self, n: usize) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(n);
        for _ in 0..n {
            bytes.push(self.next_byte().await);
        }
        bytes
    }

    /// Everything the display sent has been read
    pub fn is_drained(&self) -> bool {
        self.wire.0.borrow().is_empty()
    }

    fn reply(&self, bytes: &[u8]) {
        self.transport.receive(bytes);
    }

    fn reply_unit(&self, payload: &[u8]) {
        let mut unit = vec![0u8; payload.len() + CHECKSUM_LEN];
        let len = seal(payload, &mut unit).unwrap();
        self.reply(&unit[..len]);
    }

    /// Answer requests forever
    pub async fn serve(&self) {
        loop {
            let opcode = self.next_byte().await;
            self.log.borrow_mut().opcodes.push(opcode);
            if self.faults.silent {
                continue;
            }

            match opcode {
                LOAD_ALL => self.serve_load_all(),
                READ_IMG => self.serve_image().await,
                SET_VOLUME => {
                    let mut frame = vec![opcode];
                    frame.extend(self.next_bytes(VolumeFrame::LEN - 1).await);
                    let decoded = VolumeFrame::decode(&frame).unwrap();
                    self.log.borrow_mut().volumes.push(decoded);
                }
                SET_MUTE => {
                    let mut frame = vec![opcode];
                    frame.extend(self.next_bytes(MuteFrame::LEN - 1).await);
                    let decoded = MuteFrame::decode(&frame).unwrap();
                    self.log.borrow_mut().mutes.push(decoded);
                }
                ECHO => {
                    let mut text = Vec::new();
                    loop {
                        match self.next_byte().await {
                            0 => break,
                            byte => text.push(byte),
                        }
                    }
                    self.log.borrow_mut().echoes.push(text);
                }
                QUERY_CHANGES => self.serve_poll(),
                RESPONSE_OK | RESPONSE_FAIL => {
                    let mut frame = vec![opcode];
                    frame.extend(self.next_bytes(SENTINEL_LEN - 1).await);
                    let sentinel = Response::from_frame(&frame).unwrap();
                    self.log.borrow_mut().sentinels.push(sentinel);
                }
                other => panic!("host got unexpected byte {other:#04x}"),
            }
        }
    }

    fn serve_load_all(&self) {
        let count = self
            .faults
            .count_override
            .unwrap_or(self.sessions.len() as u8);
        self.reply_unit(&[count]);

        for (index, session) in self.sessions.iter().enumerate() {
            let header = EntryHeader {
                pid: session.pid,
                volume: session.volume,
                muted: session.muted,
                name_len: session.name.len() as u8,
            };
            let mut unit = header.sealed();
            if self.faults.corrupt_entry == Some(index) {
                unit[0] ^= 0x01;
            }
            self.reply(&unit);
            self.reply_unit(&session.name);
        }
    }

    async fn serve_image(&self) {
        let request = ImageRequest::decode(&self.next_bytes(ImageRequest::LEN).await).unwrap();
        self.log.borrow_mut().image_requests.push(request.pid);

        let image = self
            .images
            .iter()
            .find(|(pid, _)| *pid == request.pid)
            .map(|(_, data)| data.clone())
            .unwrap_or_default();
        self.reply(&seal_u32(image.len() as u32));

        // Either the chunk size or a FAIL when the display cannot take it
        let head = self.next_bytes(SENTINEL_LEN).await;
        if let Some(sentinel) = Response::from_frame(&head) {
            self.log.borrow_mut().sentinels.push(sentinel);
            return;
        }
        let mut unit = head;
        unit.extend(self.next_bytes(4 + CHECKSUM_LEN - SENTINEL_LEN).await);
        let chunk_size = read_u32(open(&unit).unwrap()).unwrap();
        self.log.borrow_mut().chunk_size = Some(chunk_size);

        for (index, chunk) in image.chunks(chunk_size as usize).enumerate() {
            let mut unit = vec![0u8; chunk.len() + CHECKSUM_LEN];
            seal(chunk, &mut unit).unwrap();
            if self.faults.corrupt_chunk == Some(index) {
                unit[0] ^= 0x80;
            }
            self.reply(&unit);
            self.log.borrow_mut().chunks.push(chunk.len());

            let sentinel = Response::from_frame(&self.next_bytes(SENTINEL_LEN).await).unwrap();
            self.log.borrow_mut().sentinels.push(sentinel);
            if sentinel == Response::Fail {
                return;
            }
        }
    }

    fn serve_poll(&self) {
        let mut unit = vec![0u8; 1 + CHECKSUM_LEN];
        seal(&[self.change_flag], &mut unit).unwrap();
        if self.faults.corrupt_poll {
            unit[0] ^= 0x01;
        }
        let len = self.faults.truncate_poll.unwrap_or(unit.len());
        self.reply(&unit[..len]);
    }
}

/// Spin until `done` holds, giving the host and flush task a turn each time
pub async fn until(done: impl Fn() -> bool) {
    while !done() {
        yield_now().await;
    }
}
