// Copyright 2024 Understudy Contributors
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Spies: recording calls while the real code keeps running.

mod common;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use understudy_core::{
    assert_call_count, assert_called, assert_called_once, assert_called_once_with,
    assert_called_with, Double, Sandbox, Seam,
};
use understudy_demo::callbacks::{run_if, Once};
use understudy_demo::roulette::Roulette;

#[test]
fn spy_on_a_method_records_the_exact_argument() {
    common::init_tracing();
    let sandbox = Sandbox::new();
    let method = Seam::function("method", |_: i32| ());

    let spy = sandbox.spy(&method).unwrap();
    method.call(1).unwrap();

    assert_called!(spy);
    assert_called_once!(spy);
    assert_called_once_with!(spy, 1);
}

#[test]
fn spy_as_a_callback_argument() {
    let callback: Double<(), ()> = Double::new("callback");

    run_if(true, &callback.as_callback());

    assert_called_once!(callback);
}

#[test]
fn spy_skipped_callback_is_not_called() {
    let callback: Double<(), ()> = Double::new("callback");

    run_if(false, &callback.as_callback());

    assert!(!callback.was_called());
}

#[test]
fn call_at_reports_each_calls_arguments() {
    let sandbox = Sandbox::new();
    let roulette = Roulette::new();
    let spy = sandbox.spy(roulette.bet_on_number_seam()).unwrap();

    roulette.bet_on_number(6).unwrap();
    roulette.bet_on_number(8).unwrap();
    roulette.bet_on_number(10).unwrap();

    assert_eq!(spy.call_at(0).map(|call| call.args), Some(6));
    assert_eq!(spy.call_at(1).map(|call| call.args), Some(8));
    assert_eq!(spy.call_at(2).map(|call| call.args), Some(10));
    assert!(spy.call_at(3).is_none());

    let calls = spy.all_calls();
    let args: Vec<u8> = calls.iter().map(|call| call.args).collect();
    assert_eq!(args, vec![6, 8, 10]);
    assert!(calls.windows(2).all(|pair| pair[0].sequence < pair[1].sequence));

    // The spy called through, so the bets reached the table.
    assert_eq!(roulette.bets(), vec![6, 8, 10]);
    assert_call_count!(spy, 3);
    assert_called_with!(spy, 8);
}

#[test]
fn restored_spy_forgets_its_calls() {
    let sandbox = Sandbox::new();
    let roulette = Roulette::new();
    let spy = sandbox.spy(roulette.bet_on_number_seam()).unwrap();
    roulette.bet_on_number(6).unwrap();

    assert!(spy.restore());
    assert_eq!(spy.call_count(), 0);

    roulette.bet_on_number(8).unwrap();
    assert_eq!(spy.call_count(), 0);
    assert_eq!(roulette.bets(), vec![6, 8]);
}

#[test]
fn once_runs_the_wrapped_fake_a_single_time() {
    let callback: Double<(), u32> = Double::new("callback");
    callback.returns(7);
    let wrapped = callback.clone();
    let proxy = Once::new(move || wrapped.call(()).map(|reply| reply.value_or(0)).unwrap_or(0));

    assert_eq!(*proxy.call(), 7);
    assert_eq!(*proxy.call(), 7);

    assert_called_once!(callback);
}

#[test]
fn spies_order_calls_across_doubles() {
    let first: Double<(), ()> = Double::new("first");
    let second: Double<(), ()> = Double::new("second");

    first.call(()).unwrap();
    second.call(()).unwrap();

    assert!(first.was_called_before(&second));
    assert!(second.was_called_after(&first));
    assert!(!second.was_called_before(&first));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn spy_records_every_concurrent_call() {
    let spy = Arc::new(understudy_core::spy("bet", |n: u32| n));
    let observed = Arc::new(AtomicUsize::new(0));

    let tasks = (0..32u32).map(|n| {
        let spy = Arc::clone(&spy);
        let observed = Arc::clone(&observed);
        tokio::spawn(async move {
            if spy.call(n).unwrap().into_value() == Some(n) {
                observed.fetch_add(1, Ordering::SeqCst);
            }
        })
    });
    for joined in futures::future::join_all(tasks).await {
        joined.unwrap();
    }

    assert_eq!(spy.call_count(), 32);
    assert_eq!(observed.load(Ordering::SeqCst), 32);
    for n in 0..32u32 {
        assert_eq!(spy.call_count_with(&n), 1);
    }
}
