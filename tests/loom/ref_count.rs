#![cfg(loom)]

use loom::sync::Arc;
use loom::sync::atomic::AtomicUsize;
use loom::sync::atomic::Ordering;
use loom::thread;
use proclet::group::RefCount;

#[test]
fn concurrent_add_then_release() {
  loom::model(|| {
    let count: Arc<RefCount> = Arc::new(RefCount::new());

    let threads: Vec<_> = (0..2)
      .map(|_| {
        let count: Arc<RefCount> = Arc::clone(&count);

        thread::spawn(move || {
          count.add();
          count.release();
        })
      })
      .collect();

    for handle in threads {
      handle.join().unwrap();
    }

    assert_eq!(count.get(), 1);
  });
}

#[test]
fn exactly_one_release_observes_zero() {
  loom::model(|| {
    let count: Arc<RefCount> = Arc::new(RefCount::new());
    let zeros: Arc<AtomicUsize> = Arc::new(AtomicUsize::new(0));

    count.add();

    let threads: Vec<_> = (0..2)
      .map(|_| {
        let count: Arc<RefCount> = Arc::clone(&count);
        let zeros: Arc<AtomicUsize> = Arc::clone(&zeros);

        thread::spawn(move || {
          if count.release() == 0 {
            zeros.fetch_add(1, Ordering::Relaxed);
          }
        })
      })
      .collect();

    for handle in threads {
      handle.join().unwrap();
    }

    assert_eq!(zeros.load(Ordering::Relaxed), 1, "zero observed more than once");
    assert_eq!(count.get(), 0);
  });
}
