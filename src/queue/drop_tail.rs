//! DropTail（尾丢弃）队列
//!
//! 当队列已满时，直接丢弃新到达的 packet。

use std::collections::VecDeque;

use crate::net::{DropReason, Packet};

use super::{Dropped, PacketQueue};

#[derive(Debug)]
pub struct DropTailQueue {
    max_pkts: u32,
    q: VecDeque<Packet>,
}

impl DropTailQueue {
    pub fn new(max_pkts: u32) -> Self {
        Self {
            max_pkts,
            q: VecDeque::new(),
        }
    }
}

impl PacketQueue for DropTailQueue {
    fn enqueue(&mut self, pkt: Packet) -> Result<(), Dropped> {
        if self.q.len() >= self.max_pkts as usize {
            return Err(Dropped {
                pkt,
                reason: DropReason::QueueFull,
            });
        }
        self.q.push_back(pkt);
        Ok(())
    }

    fn dequeue(&mut self) -> Option<Packet> {
        self.q.pop_front()
    }

    fn len(&self) -> usize {
        self.q.len()
    }

    fn capacity_pkts(&self) -> u32 {
        self.max_pkts
    }
}
