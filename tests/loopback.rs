#![cfg(not(loom))]

use std::cell::RefCell;
use std::rc::Rc;

use proclet::error::SchedError;
use proclet::init::RuntimeConfig;
use proclet::lang::Pid;
use proclet::lang::WorldRank;
use proclet::node::Node;
use proclet::node::WorldLayout;
use proclet::rtw::LeaderPolicy;
use proclet::sched::Scheduler;
use proclet::transport::Loopback;
use proclet::transport::LoopbackPort;
use proclet::transport::Message;

const PING: u32 = 1;
const PONG: u32 = 2;

fn scheduler(count: u32) -> Scheduler<Loopback> {
  Scheduler::new(Rc::new(Node::local(count).unwrap()), Loopback::new(), &RuntimeConfig::new())
}

#[test]
fn ping_pong() {
  let mut sched: Scheduler<Loopback> = scheduler(2);
  let port: LoopbackPort = sched.transport().port();
  let seen: Rc<RefCell<Vec<Message>>> = Rc::default();

  sched.spawn(2, |cx| {
    let port: LoopbackPort = port.clone();
    let seen: Rc<RefCell<Vec<Message>>> = Rc::clone(&seen);

    async move {
      if cx.fgrank().get() == 0 {
        port.send(&cx, WorldRank::new(1), PING, b"ping".to_vec()).unwrap();
        let pong: Message = port.recv(&cx, PONG).await;
        seen.borrow_mut().push(pong);
      } else {
        let ping: Message = port.recv(&cx, PING).await;
        port.send(&cx, ping.source, PONG, b"pong".to_vec()).unwrap();
        seen.borrow_mut().push(ping);
      }
    }
  });

  sched.run_until_all_finished().unwrap();

  let seen = seen.borrow();

  assert_eq!(seen.len(), 2);
  assert_eq!(seen[0].source, WorldRank::new(0));
  assert_eq!(seen[0].payload, b"ping");
  assert_eq!(seen[1].source, WorldRank::new(1));
  assert_eq!(seen[1].payload, b"pong");
  assert_eq!(sched.transport().in_flight(), 0);
  assert_eq!(sched.transport().unreceived(), 0);
}

#[test]
fn receive_matches_tag_out_of_order() {
  let mut sched: Scheduler<Loopback> = scheduler(2);
  let port: LoopbackPort = sched.transport().port();
  let tags: Rc<RefCell<Vec<u32>>> = Rc::default();

  sched.spawn(2, |cx| {
    let port: LoopbackPort = port.clone();
    let tags: Rc<RefCell<Vec<u32>>> = Rc::clone(&tags);

    async move {
      if cx.fgrank().get() == 0 {
        for tag in [7, 8, 9] {
          port.send(&cx, WorldRank::new(1), tag, Vec::new()).unwrap();
        }
      } else {
        for tag in [9, 7, 8] {
          tags.borrow_mut().push(port.recv(&cx, tag).await.tag);
        }
      }
    }
  });

  sched.run_until_all_finished().unwrap();

  assert_eq!(*tags.borrow(), [9, 7, 8]);
}

#[test]
fn unmatched_receive_stalls() {
  let mut sched: Scheduler<Loopback> = scheduler(2);
  let port: LoopbackPort = sched.transport().port();

  sched.spawn(2, |cx| {
    let port: LoopbackPort = port.clone();

    async move {
      if cx.fgrank().get() == 0 {
        port.send(&cx, WorldRank::new(1), PING, Vec::new()).unwrap();
      } else {
        port.recv(&cx, PONG).await;
      }
    }
  });

  assert_eq!(
    sched.run_until_all_finished(),
    Err(SchedError::Stalled { waiting: 1 }),
  );
  assert_eq!(sched.transport().unreceived(), 1);
}

#[test]
fn send_outside_process_fails() {
  let layout: WorldLayout = WorldLayout::uniform(2, 2).unwrap();
  let node: Node = Node::new(Pid::new(0), layout, LeaderPolicy::default()).unwrap();
  let mut sched: Scheduler<Loopback> = Scheduler::new(Rc::new(node), Loopback::new(), &RuntimeConfig::new());
  let port: LoopbackPort = sched.transport().port();
  let failed: Rc<RefCell<bool>> = Rc::default();

  sched.spawn(1, |cx| {
    let port: LoopbackPort = port.clone();
    let failed: Rc<RefCell<bool>> = Rc::clone(&failed);

    async move {
      *failed.borrow_mut() = port.send(&cx, WorldRank::new(3), PING, Vec::new()).is_err();
    }
  });

  sched.run_until_all_finished().unwrap();

  assert!(*failed.borrow());
  assert_eq!(sched.transport().in_flight(), 0);
}
