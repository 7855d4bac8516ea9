//! Expiry tests for the timeout guard.
//!
//! Tests verify:
//! - Slow work expires while fast work completes
//! - Rescheduling keeps exactly one timer alive
//! - Deadlines are absolute in the runtime's clock domain
//! - Past deadlines fire at the next scheduling opportunity
//! - The wall clock cuts regions short in real time

use super::util::init_test;
use crate::common::*;
use coop_timeout::runtime::RuntimeBuilder;
use coop_timeout::types::Time;
use coop_timeout::{make_timeout, make_timeout_at, timeout, ErrorKind};
use std::time::Duration;

/// Test a pool of guarded workers with mixed deadlines.
#[test]
fn test_guarded_worker_pool_mixes_expiry_and_success() {
    init_test("test_guarded_worker_pool_mixes_expiry_and_success");
    let runtime = virtual_runtime();
    let handle = runtime.handle();
    let results = runtime
        .block_on(move |cx| async move {
            let mut workers = Vec::new();
            for (work_ms, limit_ms) in [(50_u64, 100_u64), (300, 100), (10, 10), (0, 0)] {
                workers.push(cx.spawn(move |cx| async move {
                    let inner = cx.clone();
                    timeout(&cx, Some(Duration::from_millis(limit_ms)), async move {
                        inner.sleep(Duration::from_millis(work_ms)).await?;
                        Ok(work_ms)
                    })
                    .await
                }));
            }
            let mut results = Vec::new();
            for worker in &workers {
                results.push(worker.join().await.map_err(|e| e.kind()));
            }
            assert_eq!(handle.live_tasks(), 1);
            assert_eq!(handle.armed_timers(), 0);
            Ok(results)
        })
        .expect("root completes");

    assert_eq!(
        results,
        vec![
            Ok(50),
            Err(ErrorKind::DeadlineExceeded),
            Ok(10),
            Ok(0),
        ]
    );
    assert_eq!(runtime.now(), Time::from_millis(100));
    test_complete!("test_guarded_worker_pool_mixes_expiry_and_success");
}

/// Test that a heartbeat reschedule never leaves more than one live timer.
#[test]
fn test_rescheduling_keeps_a_single_live_timer() {
    init_test("test_rescheduling_keeps_a_single_live_timer");
    let runtime = virtual_runtime();
    let handle = runtime.handle();
    runtime
        .block_on(move |cx| async move {
            let mut guard = make_timeout(&cx, Some(Duration::from_secs(1)));
            guard.enter(&cx)?;
            for step in 1..=5_u64 {
                cx.sleep(Duration::from_millis(500)).await?;
                guard.reschedule(Some(cx.now() + Duration::from_secs(1)))?;
                cx.yield_now().await?;
                test_section!(format!("reschedule {step}"));
                assert_eq!(handle.live_tasks(), 2, "root plus one timer");
            }
            guard.exit(None).await?;
            assert!(!guard.expired());
            assert_eq!(handle.live_tasks(), 1);
            Ok(())
        })
        .expect("heartbeat keeps the guard alive");
    assert_eq!(runtime.now(), Time::from_millis(2500));
    test_complete!("test_rescheduling_keeps_a_single_live_timer");
}

/// Test that a relative delay is added to a clock that does not start at zero.
#[test]
fn test_deadline_from_nonzero_clock() {
    init_test("test_deadline_from_nonzero_clock");
    let runtime = virtual_runtime_at(Time::from_secs(1_000));
    let err = runtime
        .block_on(|cx| async move {
            let guard = make_timeout(&cx, Some(Duration::from_millis(5)));
            assert_eq!(guard.when(), Some(Time::from_millis(1_000_005)));
            guard.run(&cx, cx.sleep(Duration::from_secs(1))).await
        })
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::DeadlineExceeded);
    assert_eq!(err.deadline(), Some(Time::from_millis(1_000_005)));
    test_complete!("test_deadline_from_nonzero_clock");
}

/// Test that a deadline already in the past fires without advancing time.
#[test]
fn test_past_deadline_fires_at_next_opportunity() {
    init_test("test_past_deadline_fires_at_next_opportunity");
    let runtime = virtual_runtime_at(Time::from_secs(10));
    let err = runtime
        .block_on(|cx| async move {
            make_timeout_at(Some(Time::from_secs(3)))
                .run(&cx, cx.sleep(Duration::from_secs(1)))
                .await
        })
        .unwrap_err();
    assert!(err.is_timeout());
    assert_eq!(runtime.now(), Time::from_secs(10), "no time passed");
    test_complete!("test_past_deadline_fires_at_next_opportunity");
}

/// Test that the wall clock enforces the deadline in real time.
#[test]
fn test_wall_clock_guard_expires() {
    init_test("test_wall_clock_guard_expires");
    let runtime = RuntimeBuilder::wall_clock()
        .build()
        .expect("wall clock runtime");
    let started = std::time::Instant::now();
    let err = runtime
        .block_on(|cx| async move {
            timeout(&cx, Some(Duration::from_millis(20)), async {
                cx.sleep(Duration::from_secs(5)).await
            })
            .await
        })
        .unwrap_err();
    assert!(err.is_timeout());
    let elapsed = started.elapsed();
    assert!(elapsed >= Duration::from_millis(20));
    assert!(elapsed < Duration::from_secs(5), "region was cut short");
    test_complete!("test_wall_clock_guard_expires");
}
