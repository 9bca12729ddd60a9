// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2025 Daniel Negri
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program. If not, see <https://www.gnu.org/licenses/>.

//! Multi-threaded store tests.
//!
//! Many threads hammer the same store, mixing writes to one shared session
//! with session creation and reads. parking_lot's deadlock detector (enabled
//! through the `deadlock_detection` dev feature) watches the lock graph
//! while they run.

use chip_ledger::{NewPlayer, SessionCode, SessionStore, TransactionId, TransactionRequest};
use parking_lot::deadlock;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::thread::{self, JoinHandle};
use std::time::Duration;

const THREADS: usize = 8;
const WRITES_PER_THREAD: usize = 250;

struct DeadlockDetector {
    running: Arc<AtomicBool>,
    handle: JoinHandle<usize>,
}

/// Polls parking_lot's detector until stopped; returns the number of cycles seen.
fn start_deadlock_detector() -> DeadlockDetector {
    let running = Arc::new(AtomicBool::new(true));
    let flag = Arc::clone(&running);

    let handle = thread::spawn(move || {
        let mut found = 0;
        while flag.load(Ordering::SeqCst) {
            thread::sleep(Duration::from_millis(50));
            let deadlocks = deadlock::check_deadlock();
            for (i, threads) in deadlocks.iter().enumerate() {
                eprintln!("Deadlock #{}", i + 1);
                for t in threads {
                    eprintln!("Thread ID: {:?}\n{:#?}", t.thread_id(), t.backtrace());
                }
            }
            found += deadlocks.len();
        }
        found
    });

    DeadlockDetector { running, handle }
}

fn stop_deadlock_detector(detector: DeadlockDetector) -> usize {
    detector.running.store(false, Ordering::SeqCst);
    detector.handle.join().unwrap()
}

fn shared_session(store: &SessionStore) -> SessionCode {
    store
        .create_session(&[NewPlayer::named("Alice"), NewPlayer::named("Bob")])
        .unwrap()
        .game_code
}

#[test]
fn concurrent_writes_to_one_session_get_unique_sequential_ids() {
    let store = Arc::new(SessionStore::new());
    let code = shared_session(&store);
    let detector = start_deadlock_detector();

    let handles: Vec<_> = (0..THREADS)
        .map(|t| {
            let store = Arc::clone(&store);
            let code = code.clone();
            thread::spawn(move || {
                (0..WRITES_PER_THREAD)
                    .map(|i| {
                        let request = if (t + i) % 2 == 0 {
                            TransactionRequest::buy("Alice", 1)
                        } else {
                            TransactionRequest::transfer("Bob", "Alice", 1, "iou")
                        };
                        store.record_transaction(&code, &request).unwrap().id
                    })
                    .collect::<Vec<_>>()
            })
        })
        .collect();

    let mut ids: Vec<TransactionId> = handles
        .into_iter()
        .flat_map(|h| h.join().unwrap())
        .collect();

    assert_eq!(stop_deadlock_detector(detector), 0);

    ids.sort();
    let expected: Vec<TransactionId> = (1..=(THREADS * WRITES_PER_THREAD) as u32)
        .map(TransactionId)
        .collect();
    assert_eq!(ids, expected);

    // The log is stored in id order.
    let log = store.transactions(&code).unwrap();
    assert!(log.windows(2).all(|w| w[0].id < w[1].id));
}

#[test]
fn readers_and_writers_across_sessions_do_not_deadlock() {
    let store = Arc::new(SessionStore::new());
    let shared = shared_session(&store);
    let created = Arc::new(AtomicUsize::new(0));
    let detector = start_deadlock_detector();

    let handles: Vec<_> = (0..THREADS)
        .map(|t| {
            let store = Arc::clone(&store);
            let shared = shared.clone();
            let created = Arc::clone(&created);
            thread::spawn(move || {
                for i in 0..WRITES_PER_THREAD {
                    match i % 4 {
                        0 => {
                            let own = store
                                .create_session(&[NewPlayer::named(format!("P{t}-{i}"))])
                                .unwrap();
                            created.fetch_add(1, Ordering::SeqCst);
                            store
                                .record_transaction(
                                    &own.game_code,
                                    &TransactionRequest::buy(format!("P{t}-{i}"), 5),
                                )
                                .unwrap();
                        }
                        1 => {
                            store
                                .record_transaction(&shared, &TransactionRequest::buy("Bob", 3))
                                .unwrap();
                        }
                        2 => {
                            let summary = store.summary(&shared).unwrap();
                            assert!(summary.balance("Alice").is_some());
                        }
                        _ => {
                            let _ = store.add_player(&shared, Some(format!("Guest{t}").as_str()));
                        }
                    }
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(stop_deadlock_detector(detector), 0);
    assert_eq!(store.len(), created.load(Ordering::SeqCst) + 1);

    let summary = store.summary(&shared).unwrap();
    let buys_per_thread = (0..WRITES_PER_THREAD).filter(|i| i % 4 == 1).count() as u64;
    assert_eq!(summary.bank().chips_issued, THREADS as u64 * buys_per_thread * 3);
    // Every guest was seated exactly once despite repeated attempts.
    assert_eq!(store.players(&shared).unwrap().len(), 2 + THREADS);
}
