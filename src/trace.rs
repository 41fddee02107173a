//! ASCII 事件 trace
//!
//! 每行一个事件：
//!
//! ```text
//! + 1.000000 G1_G2 G1->G2 id=0 udp 10.0.1.1:49153 > 10.0.1.2:9 len=240
//! ```
//!
//! `+` 入队，`-` 出队开始发送，`d` 丢弃，`r` 到达链路对端。

use std::fmt::Write as _;
use std::fs;
use std::path::Path;

use crate::error::{Error, Result};
use crate::net::{IpProtocol, Packet};
use crate::sim::SimTime;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TraceOp {
    Enqueue,
    Dequeue,
    Drop,
    Receive,
}

impl TraceOp {
    pub fn symbol(self) -> char {
        match self {
            TraceOp::Enqueue => '+',
            TraceOp::Dequeue => '-',
            TraceOp::Drop => 'd',
            TraceOp::Receive => 'r',
        }
    }
}

/// 内存中的 trace，运行结束后一次写出
#[derive(Debug, Default)]
pub struct AsciiTrace {
    buf: String,
    lines: usize,
}

impl AsciiTrace {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(
        &mut self,
        op: TraceOp,
        now: SimTime,
        link: &str,
        from: &str,
        to: &str,
        pkt: &Packet,
    ) {
        let proto = match pkt.protocol() {
            IpProtocol::Icmp => "icmp",
            IpProtocol::Tcp => "tcp",
            IpProtocol::Udp => "udp",
        };
        let _ = writeln!(
            self.buf,
            "{} {:.6} {} {}->{} id={} {} {}:{} > {}:{} len={}",
            op.symbol(),
            now.as_secs_f64(),
            link,
            from,
            to,
            pkt.id,
            proto,
            pkt.src,
            pkt.src_port,
            pkt.dst,
            pkt.dst_port,
            pkt.wire_bytes(),
        );
        self.lines += 1;
    }

    pub fn len(&self) -> usize {
        self.lines
    }

    pub fn is_empty(&self) -> bool {
        self.lines == 0
    }

    pub fn as_str(&self) -> &str {
        &self.buf
    }

    pub fn write(&self, path: &Path) -> Result<()> {
        fs::write(path, &self.buf).map_err(|source| Error::Io {
            path: path.to_path_buf(),
            source,
        })
    }
}
