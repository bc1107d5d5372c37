use roda_window::clock::MockClock;
use roda_window::{AggregateWindow, SampleWindow};
use std::sync::atomic::AtomicBool;
use std::sync::atomic::Ordering::Relaxed;
use std::thread;
use std::time::Duration;

const WRITERS: i64 = 4;
const WRITES: i64 = 10_000;

#[test]
fn test_concurrent_adds_in_one_bucket() {
    let _clock = MockClock::start_now();
    let window = AggregateWindow::new(4, Duration::from_millis(64));

    thread::scope(|s| {
        for _ in 0..WRITERS {
            s.spawn(|| {
                for _ in 0..WRITES {
                    window.add(1);
                }
            });
        }
        s.spawn(|| {
            for _ in 0..1_000 {
                let all = window.aggregation(0);
                assert!(all.count() <= WRITERS * WRITES);
            }
        });
    });

    let all = window.aggregation(0);
    assert_eq!(all.count(), WRITERS * WRITES);
    assert_eq!(all.sum(), WRITERS * WRITES);
    assert_eq!(all.avg(), 1.0);
}

#[test]
fn test_readers_see_whole_writes_while_time_moves() {
    let clock = MockClock::start(1 << 30);
    let window = SampleWindow::new(8, Duration::from_millis(2));
    let running = AtomicBool::new(true);

    thread::scope(|s| {
        let writers: Vec<_> = (0..WRITERS)
            .map(|_| {
                s.spawn(|| {
                    for _ in 0..WRITES {
                        window.append(1);
                    }
                })
            })
            .collect();

        s.spawn(|| {
            while running.load(Relaxed) {
                clock.advance(Duration::from_millis(1));
                thread::yield_now();
            }
        });

        s.spawn(|| {
            while running.load(Relaxed) {
                // One snapshot: every live sample is a 1, whatever rolled out.
                let mut count = 0;
                let mut sum = 0;
                window.reduce(0, |slot| {
                    assert_eq!(slot.count(), slot.data().len() as i64);
                    count += slot.count();
                    sum += slot.data().iter().sum::<i64>();
                    false
                });
                assert_eq!(count, sum);
                assert!(count <= WRITERS * WRITES);
            }
        });

        for writer in writers {
            writer.join().unwrap();
        }
        running.store(false, Relaxed);
    });

    assert!(window.aggregation(0).count() <= WRITERS * WRITES);
}

#[test]
fn test_window_is_send_and_sync() {
    fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<AggregateWindow>();
    assert_send_sync::<SampleWindow>();
}
