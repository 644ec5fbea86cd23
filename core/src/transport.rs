use crossbeam_channel::{unbounded, Receiver, Sender, TryRecvError};
use log::warn;

use tether_serde::{ByteReader, ByteWriter, Serde};

use crate::SyncMessage;

/// Boundary between the engine and whatever carries bytes between
/// participants. The node never opens sockets; it hands outbound
/// messages to the transport during a step and drains whatever arrived
/// since the previous step.
///
/// The transport is assumed to deliver each enqueued message reliably
/// and in order. Transport-level faults (connection loss, malformed
/// streams) are the transport's own channel to surface, not this one's.
pub trait Transport {
    fn enqueue_outbound(&mut self, message: SyncMessage);
    fn poll_inbound(&mut self) -> Vec<SyncMessage>;
}

/// Discards outbound messages and never receives any. Lets a node run
/// standalone (single-participant sessions, unit tests).
pub struct NullTransport;

impl Transport for NullTransport {
    fn enqueue_outbound(&mut self, _message: SyncMessage) {}

    fn poll_inbound(&mut self) -> Vec<SyncMessage> {
        Vec::new()
    }
}

/// One endpoint of an in-process link. Messages pass through the real
/// wire encoding, so anything synchronized over a `LinkTransport` pair
/// has survived a serialize/deserialize round trip.
///
/// The channels are the sole thread-safe hand-off surface: a network
/// task may own the far endpoint on another thread and only ever
/// deposits into / drains these queues.
pub struct LinkTransport {
    sender: Sender<Vec<u8>>,
    receiver: Receiver<Vec<u8>>,
}

/// Two cross-wired endpoints: everything enqueued on one side arrives
/// at the other on its next poll.
pub fn link_pair() -> (LinkTransport, LinkTransport) {
    let (left_sender, right_receiver) = unbounded();
    let (right_sender, left_receiver) = unbounded();
    (
        LinkTransport {
            sender: left_sender,
            receiver: left_receiver,
        },
        LinkTransport {
            sender: right_sender,
            receiver: right_receiver,
        },
    )
}

impl Transport for LinkTransport {
    fn enqueue_outbound(&mut self, message: SyncMessage) {
        let mut writer = ByteWriter::new();
        message.ser(&mut writer);
        if self.sender.send(writer.to_bytes()).is_err() {
            warn!("outbound link closed; dropping message");
        }
    }

    fn poll_inbound(&mut self) -> Vec<SyncMessage> {
        let mut messages = Vec::new();
        loop {
            match self.receiver.try_recv() {
                Ok(bytes) => {
                    let mut reader = ByteReader::new(&bytes);
                    match SyncMessage::de(&mut reader) {
                        Ok(message) => messages.push(message),
                        Err(error) => {
                            warn!("dropping undecodable inbound message: {error}");
                        }
                    }
                }
                Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => break,
            }
        }
        messages
    }
}
