//! Cancel-correctness tests for the timeout guard.
//!
//! These tests verify the CRITICAL invariant that a guard only ever converts
//! its own timer's cancellation into `DeadlineExceeded`, and never swallows
//! a cancellation somebody else requested.

use super::util::{init_test, StepLog};
use crate::common::*;
use coop_timeout::types::Time;
use coop_timeout::{make_timeout, timeout, CompletionStatus, Error, ErrorKind};
use std::time::Duration;

/// Test that code after an expired region keeps running normally.
#[test]
fn test_cleanup_code_after_expiry_still_runs() {
    init_test("test_cleanup_code_after_expiry_still_runs");
    let runtime = virtual_runtime();
    let log = StepLog::new();
    let out = log.clone();
    let value = runtime
        .block_on(move |cx| async move {
            let attempt = timeout(&cx, Some(Duration::from_secs(1)), async {
                out.push("working");
                cx.sleep(Duration::from_secs(30)).await?;
                out.push("unreachable");
                Ok(())
            })
            .await;
            match attempt {
                Err(err) if err.kind() == ErrorKind::DeadlineExceeded => {
                    out.push("fallback");
                    cx.sleep(Duration::from_secs(1)).await?;
                    Ok("fallback")
                }
                other => other.map(|()| "primary"),
            }
        })
        .expect("fallback completes");
    assert_eq!(value, "fallback");
    assert_eq!(log.snapshot(), vec!["working", "fallback"]);
    assert_eq!(runtime.now(), Time::from_secs(2));
    test_complete!("test_cleanup_code_after_expiry_still_runs");
}

/// Test that cancelling the owner before the deadline is reported as cancellation.
#[test]
fn test_guard_in_cancelled_task_reports_cancellation() {
    init_test("test_guard_in_cancelled_task_reports_cancellation");
    let runtime = virtual_runtime();
    runtime
        .block_on(|cx| async move {
            let worker = cx.spawn(|cx| async move {
                let mut guard = make_timeout(&cx, Some(Duration::from_secs(5)));
                guard.enter(&cx)?;
                let slept = cx.sleep(Duration::from_secs(60)).await;
                let result = guard.exit(slept.err()).await;
                assert!(matches!(
                    guard.timer_status(),
                    Some(CompletionStatus::Cancelled)
                ));
                result
            });
            cx.sleep(Duration::from_secs(1)).await?;
            worker.cancel();
            let err = worker.join().await.unwrap_err();
            assert_eq!(err.kind(), ErrorKind::Cancelled);
            assert_eq!(cx.handle().live_tasks(), 1);
            Ok(())
        })
        .expect("root completes");
    test_complete!("test_guard_in_cancelled_task_reports_cancellation");
}

/// Test that an outside cancel arriving after the timer fired still reaches the owner.
#[test]
fn test_external_cancel_after_timer_reaches_owner() {
    init_test("test_external_cancel_after_timer_reaches_owner");
    let runtime = virtual_runtime();
    let log = StepLog::new();
    let out = log.clone();
    runtime
        .block_on(move |cx| async move {
            let worker = cx.spawn(move |cx| async move {
                let mut guard = make_timeout(&cx, Some(Duration::from_secs(1)));
                guard.enter(&cx)?;
                let slow = cx.spawn(|cx| async move { cx.sleep(Duration::from_secs(1)).await });
                slow.wait_shielded().await;
                let exited = guard.exit(None).await;
                assert!(exited.is_err_and(|e| e.is_timeout()));
                out.push("guard exited");
                cx.sleep(Duration::from_secs(5)).await?;
                out.push("unreachable");
                Ok(())
            });
            cx.sleep(Duration::from_secs(1)).await?;
            // Let the worker's timer fire first.
            cx.yield_now().await?;
            assert!(!worker.cancel(), "joins the timer's pending request");
            let err = worker.join().await.unwrap_err();
            assert!(err.is_cancelled());
            Ok(())
        })
        .expect("root completes");
    assert_eq!(log.snapshot(), vec!["guard exited"]);
    assert_eq!(runtime.now(), Time::from_secs(1));
    test_complete!("test_external_cancel_after_timer_reaches_owner");
}

/// Test that the region's own failure stays reachable behind the deadline error.
#[test]
fn test_deadline_error_keeps_region_error_as_source() {
    init_test("test_deadline_error_keeps_region_error_as_source");
    let runtime = virtual_runtime();
    let err = runtime
        .block_on(|cx| async move {
            let mut guard = make_timeout(&cx, Some(Duration::from_secs(1)));
            guard.enter(&cx)?;
            let slept = cx.sleep(Duration::from_secs(2)).await;
            assert!(slept.is_err());
            // The region swallows the cancellation and fails in its own way.
            guard.exit(Some(Error::user("partial write"))).await
        })
        .unwrap_err();
    assert!(err.is_timeout());
    let source = std::error::Error::source(&err).expect("source chained");
    assert!(source.to_string().contains("partial write"));
    test_complete!("test_deadline_error_keeps_region_error_as_source");
}
