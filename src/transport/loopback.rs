use std::cell::RefCell;
use std::collections::VecDeque;
use std::fmt::Debug;
use std::fmt::Formatter;
use std::fmt::Result as FmtResult;
use std::rc::Rc;

use hashbrown::HashMap;
use tokio::sync::mpsc;
use tokio::sync::mpsc::UnboundedReceiver;
use tokio::sync::mpsc::UnboundedSender;
use tokio::sync::mpsc::error::TryRecvError;
use tracing::trace;

use crate::error::TransportError;
use crate::lang::EventKey;
use crate::lang::Reason;
use crate::lang::WorldRank;
use crate::sched::Notifier;
use crate::sched::ProcletCx;
use crate::sched::Progress;

// -----------------------------------------------------------------------------
// @type - Message
// -----------------------------------------------------------------------------

/// A tagged message delivered to a proclet.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Message {
  pub source: WorldRank,
  pub tag: u32,
  pub payload: Vec<u8>,
}

#[derive(Debug)]
struct Packet {
  target: WorldRank,
  message: Message,
}

/// Delivered messages not yet received, per target.
#[derive(Debug, Default)]
struct Mailboxes {
  arrived: HashMap<WorldRank, VecDeque<Message>>,
  in_flight: usize,
}

impl Mailboxes {
  fn take(&mut self, target: WorldRank, tag: u32) -> Option<Message> {
    let queue: &mut VecDeque<Message> = self.arrived.get_mut(&target)?;
    let index: usize = queue.iter().position(|message| message.tag == tag)?;

    queue.remove(index)
  }
}

// -----------------------------------------------------------------------------
// @type - Loopback
// -----------------------------------------------------------------------------

/// In-process transport between the proclets of one OS process.
///
/// Sends are posted to a channel and become visible to the target only
/// after the scheduler advances the transport, which raises a
/// [`Reason::RECV`] notification for the target. Proclets talk to the
/// transport through a [`LoopbackPort`].
pub struct Loopback {
  recv: UnboundedReceiver<Packet>,
  port: LoopbackPort,
}

impl Loopback {
  /// Creates a transport with no message in flight.
  pub fn new() -> Self {
    let (send, recv): (UnboundedSender<Packet>, UnboundedReceiver<Packet>) = mpsc::unbounded_channel();

    Self {
      recv,
      port: LoopbackPort {
        send,
        boxes: Rc::new(RefCell::new(Mailboxes::default())),
      },
    }
  }

  /// Returns a handle through which proclets send and receive.
  #[inline]
  pub fn port(&self) -> LoopbackPort {
    self.port.clone()
  }

  /// Returns the number of messages posted but not yet delivered.
  #[inline]
  pub fn in_flight(&self) -> usize {
    self.port.boxes.borrow().in_flight
  }

  /// Returns the number of delivered messages not yet received.
  pub fn unreceived(&self) -> usize {
    self.port.boxes.borrow().arrived.values().map(VecDeque::len).sum()
  }
}

impl Default for Loopback {
  #[inline]
  fn default() -> Self {
    Self::new()
  }
}

impl Progress for Loopback {
  fn progress(&mut self, notifier: &mut Notifier<'_>) -> Result<(), TransportError> {
    loop {
      let packet: Packet = match self.recv.try_recv() {
        Ok(packet) => packet,
        Err(TryRecvError::Empty) => break,
        Err(TryRecvError::Disconnected) => {
          return Err(TransportError::new("loopback channel disconnected"));
        }
      };

      let target: WorldRank = packet.target;

      {
        let mut boxes = self.port.boxes.borrow_mut();

        boxes.in_flight -= 1;
        boxes.arrived.entry(target).or_default().push_back(packet.message);
      }

      let woken: bool = notifier.notify(EventKey::new(target, Reason::RECV));

      trace!(target: "proclet", %target, woken, "message delivered");
    }

    Ok(())
  }

  #[inline]
  fn is_quiescent(&self) -> bool {
    self.in_flight() == 0
  }
}

impl Debug for Loopback {
  fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
    f.debug_struct("Loopback")
      .field("in_flight", &self.in_flight())
      .finish_non_exhaustive()
  }
}

// -----------------------------------------------------------------------------
// @type - LoopbackPort
// -----------------------------------------------------------------------------

/// Proclet-side handle of a [`Loopback`] transport.
#[derive(Clone)]
pub struct LoopbackPort {
  send: UnboundedSender<Packet>,
  boxes: Rc<RefCell<Mailboxes>>,
}

impl LoopbackPort {
  /// Posts `payload` to the proclet with world rank `target`.
  ///
  /// Never blocks. The message is delivered on a later progress call.
  /// Fails if `target` is not hosted by the sender's OS process.
  pub fn send(&self, cx: &ProcletCx, target: WorldRank, tag: u32, payload: Vec<u8>) -> Result<(), TransportError> {
    if cx.node().layout().pid_of(target) != Some(cx.pid()) {
      return Err(TransportError::new(format!("{target} is not hosted by {}", cx.pid())));
    }

    let message: Message = Message {
      source: cx.world_rank(),
      tag,
      payload,
    };

    if self.send.send(Packet { target, message }).is_err() {
      return Err(TransportError::new("loopback channel disconnected"));
    }

    self.boxes.borrow_mut().in_flight += 1;

    trace!(target: "proclet", source = %cx.world_rank(), %target, tag, "message posted");

    Ok(())
  }

  /// Receives the oldest message tagged `tag` addressed to the calling
  /// proclet, suspending it until one is delivered.
  pub async fn recv(&self, cx: &ProcletCx, tag: u32) -> Message {
    let key: EventKey = cx.event_key(Reason::RECV);

    loop {
      let message: Option<Message> = self.boxes.borrow_mut().take(cx.world_rank(), tag);

      if let Some(message) = message {
        return message;
      }

      cx.yield_on_event(key).await;
    }
  }

  /// Returns a delivered message tagged `tag` without suspending.
  pub fn try_recv(&self, cx: &ProcletCx, tag: u32) -> Option<Message> {
    self.boxes.borrow_mut().take(cx.world_rank(), tag)
  }
}

impl Debug for LoopbackPort {
  fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
    f.debug_struct("LoopbackPort").finish_non_exhaustive()
  }
}
