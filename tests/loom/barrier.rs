#![cfg(loom)]

use loom::sync::Arc;
use loom::thread;
use proclet::group::BarrierRole;
use proclet::group::BarrierState;

#[test]
fn leader_and_follower_pass_together() {
  loom::model(|| {
    let barrier: Arc<BarrierState> = Arc::new(BarrierState::new());

    let follower = {
      let barrier: Arc<BarrierState> = Arc::clone(&barrier);

      thread::spawn(move || {
        barrier.arrive_blocking(BarrierRole::Follower, 2);
      })
    };

    barrier.arrive_blocking(BarrierRole::Leader, 2);

    follower.join().unwrap();

    assert_eq!(barrier.generation(), 1);
    assert_eq!(barrier.arrivals(), 0);
    assert!(!barrier.is_gathered());
  });
}

#[test]
fn follower_never_released_before_gathered() {
  loom::model(|| {
    let barrier: Arc<BarrierState> = Arc::new(BarrierState::new());

    let follower = {
      let barrier: Arc<BarrierState> = Arc::clone(&barrier);

      thread::spawn(move || {
        let arrival = barrier.arrive(2);
        barrier.is_released(&arrival)
      })
    };

    // The leader has not arrived, so the round cannot be released.
    let released: bool = follower.join().unwrap();

    assert!(!released);
    assert_eq!(barrier.arrivals(), 1);
    assert!(!barrier.is_gathered());
  });
}
