// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use std::sync::mpsc;
use std::sync::{Arc, Barrier};
use std::time::Duration;

#[test]
fn dispatched_jobs_run() {
    let pool = WorkerPool::new(2, 4).unwrap();
    let (tx, rx) = mpsc::channel();
    for i in 0..4 {
        let tx = tx.clone();
        pool.try_spawn(move || {
            tx.send(i).unwrap();
        })
        .unwrap();
    }
    let mut seen: Vec<i32> = (0..4).map(|_| rx.recv_timeout(Duration::from_secs(5)).unwrap()).collect();
    seen.sort_unstable();
    assert_eq!(seen, vec![0, 1, 2, 3]);
}

#[test]
fn saturation_refuses_instead_of_queuing() {
    let pool = WorkerPool::new(1, 0).unwrap();
    assert_eq!(pool.size(), 1);

    let gate = Arc::new(Barrier::new(2));
    let worker_gate = gate.clone();
    // Occupy the only worker.
    let (started_tx, started_rx) = mpsc::channel();
    pool.try_spawn(move || {
        started_tx.send(()).unwrap();
        worker_gate.wait();
    })
    .unwrap();
    started_rx.recv_timeout(Duration::from_secs(5)).unwrap();

    assert!(matches!(
        pool.try_spawn(|| {}),
        Err(ConductorError::NoFreeConductorWorker)
    ));

    gate.wait();
    // The worker comes back; dispatch succeeds again.
    let (tx, rx) = mpsc::channel();
    let deadline = std::time::Instant::now() + Duration::from_secs(5);
    loop {
        let tx = tx.clone();
        match pool.try_spawn(move || {
            tx.send(()).unwrap();
        }) {
            Ok(()) => break,
            Err(_) if std::time::Instant::now() < deadline => {
                std::thread::sleep(Duration::from_millis(5));
            }
            Err(error) => panic!("worker never freed up: {error}"),
        }
    }
    rx.recv_timeout(Duration::from_secs(5)).unwrap();
}

#[test]
fn dropping_the_pool_joins_workers() {
    let pool = WorkerPool::new(3, 3).unwrap();
    let (tx, rx) = mpsc::channel();
    pool.try_spawn(move || {
        tx.send(()).unwrap();
    })
    .unwrap();
    rx.recv_timeout(Duration::from_secs(5)).unwrap();
    drop(pool);
}
