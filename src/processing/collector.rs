// src/processing/collector.rs
use std::{convert::Infallible, sync::Arc, time::Duration};

use tracing::error;

use crate::error::{Error, ItemError};
use crate::processing::parallel::Batch;
use crate::processing::partition::Range;
use crate::utils::context::Context;

type ErasedProducer = Box<dyn Fn(&Context) + Send + Sync>;
type ErasedConsumer<'a> = Box<dyn FnMut(&Context, Result<(), ItemError<Infallible>>) + 'a>;

/// A producer and the consumer that receives its result.
///
/// Each pair is typed independently; the value travels from producer to
/// consumer over a channel private to the pair.
pub struct Pair<'a> {
    producer: ErasedProducer,
    consumer: ErasedConsumer<'a>,
}

impl<'a> Pair<'a> {
    pub fn new<T, E, P, C>(producer: P, mut consumer: C) -> Self
    where
        T: Send + 'static,
        E: Send + 'static,
        P: Fn(&Context) -> Result<T, E> + Send + Sync + 'static,
        C: FnMut(&Context, Result<T, ItemError<E>>) + 'a,
    {
        let (tx, rx) = flume::bounded::<Result<T, E>>(1);

        let producer: ErasedProducer = Box::new(move |ctx| {
            let _ = tx.try_send(producer(ctx));
        });

        let consumer: ErasedConsumer<'a> = Box::new(move |ctx, delivered| {
            let outcome = match delivered {
                Ok(()) => match rx.try_recv() {
                    Ok(result) => result.map_err(ItemError::Producer),
                    Err(err) => {
                        error!(error = %err, "Producer finished without leaving a result");
                        return;
                    }
                },
                Err(ItemError::Panicked(message)) => Err(ItemError::Panicked(message)),
                Err(ItemError::Producer(never)) => match never {},
            };
            consumer(ctx, outcome);
        });

        Self { producer, consumer }
    }
}

/// Runs every pair's producer concurrently, then each consumer that got a
/// result in time, one after another on the calling thread.
///
/// Errors follow `Batch::run`: an empty list is `Error::EmptyBatch`, and a pair
/// that misses `timeout` makes the call return `Error::TimedOut` without its
/// consumer running.
pub fn collect(ctx: &Context, timeout: Duration, pairs: Vec<Pair<'_>>) -> Result<(), Error> {
    let (producers, mut consumers): (Vec<_>, Vec<_>) = pairs
        .into_iter()
        .map(|pair| (pair.producer, pair.consumer))
        .unzip();
    let producers = Arc::new(producers);

    Batch::new(producers.len(), 1, timeout).run(
        ctx,
        move |ctx: &Context, range: Range| -> Result<(), Infallible> {
            (producers[range.from])(ctx);
            Ok(())
        },
        |ctx, range, delivered| {
            if let Some(consumer) = consumers.get_mut(range.from) {
                consumer(ctx, delivered);
            }
        },
    )
}
