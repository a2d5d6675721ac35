// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Parallel execution of [`Feature`]s.
//!
//! Every [`Feature`] is handed to a bounded pool of worker threads along with
//! a [`oneshot`] channel the worker sends it back through once executed.
//! Workers share nothing mutable: each one populates its own [`Registry`] and
//! executes on its own clone of the [`Context`].

use std::{
    collections::VecDeque,
    num::NonZeroUsize,
    sync::{
        atomic::{AtomicBool, Ordering},
        Mutex, PoisonError,
    },
    thread,
};

use futures::{
    channel::oneshot,
    executor::block_on,
    future,
};

use crate::{
    context::Context,
    feature::Feature,
    registry::{Register, Registry},
    Error, Result,
};

/// [`Feature`] waiting for a worker, along with the channel to send it back.
type Job = (Feature, oneshot::Sender<Result<Feature>>);

/// Executes the given `features` on up to `parallel` worker threads.
///
/// Returns the executed [`Feature`]s in the order of the given ones,
/// whatever order they finish in. Once any [`Feature`] fails fatally, no
/// other one is started.
///
/// # Errors
///
/// - the fatal error of the first failed [`Feature`], in submission order;
/// - [`Error::WorkerLost`] if a worker didn't send its [`Feature`] back.
pub(crate) fn run<R>(
    register: &R,
    ctx: &Context,
    features: Vec<Feature>,
    parallel: NonZeroUsize,
) -> Result<Vec<Feature>>
where
    R: Register + ?Sized,
{
    let names = features
        .iter()
        .map(|f| f.name().to_owned())
        .collect::<Vec<_>>();
    let (jobs, receivers): (VecDeque<Job>, Vec<_>) = features
        .into_iter()
        .map(|feature| {
            let (sender, receiver) = oneshot::channel();
            ((feature, sender), receiver)
        })
        .unzip();
    let workers = parallel.get().min(jobs.len());
    tracing::debug!(features = names.len(), workers, "dispatching features");

    let queue = Mutex::new(jobs);
    let aborted = AtomicBool::new(false);
    thread::scope(|s| {
        let handles = (0..workers)
            .map(|_| s.spawn(|| work(register, ctx, &queue, &aborted)))
            .collect::<Vec<_>>();
        for handle in handles {
            if handle.join().is_err() {
                tracing::error!("worker panicked");
            }
        }
    });
    // Drops the senders of the features no worker picked up.
    drop(queue);

    let results = block_on(future::join_all(receivers));
    let mut executed = Vec::with_capacity(results.len());
    let mut lost = None;
    for (result, name) in results.into_iter().zip(names) {
        match result {
            Ok(Ok(feature)) => executed.push(feature),
            Ok(Err(e)) => return Err(e),
            Err(oneshot::Canceled) => {
                _ = lost.get_or_insert(name);
            }
        }
    }
    match lost {
        Some(feature) => Err(Error::WorkerLost { feature }),
        None => Ok(executed),
    }
}

/// Executes queued [`Job`]s until the queue is drained or the run aborted.
fn work<R>(
    register: &R,
    ctx: &Context,
    queue: &Mutex<VecDeque<Job>>,
    aborted: &AtomicBool,
) where
    R: Register + ?Sized,
{
    while !aborted.load(Ordering::Acquire) {
        let Some((feature, sender)) = queue
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop_front()
        else {
            break;
        };
        let result = execute(register, ctx, feature);
        if result.is_err() {
            aborted.store(true, Ordering::Release);
        }
        _ = sender.send(result);
    }
}

/// Executes a single [`Feature`] against a freshly populated [`Registry`] and
/// a private clone of the [`Context`].
fn execute<R>(register: &R, ctx: &Context, mut feature: Feature) -> Result<Feature>
where
    R: Register + ?Sized,
{
    let registry = Registry::build(register)?;
    let mut ctx = ctx.clone();
    feature.execute(&registry, &mut ctx)?;
    Ok(feature)
}
