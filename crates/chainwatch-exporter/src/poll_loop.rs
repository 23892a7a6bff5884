//! The per-deployment poll loop.
//!
//! # Initializing
//! Seed the bootstrap quorum gauges, mark the deployment down, read the chain
//! head as the starting cursor, mark it up.
//!
//! # Running
//! On every interval tick:
//!   - Read the head; if it has not moved past the cursor, do nothing
//!   - Fetch logs for at most `max_range` blocks from the cursor
//!   - Classify and dispatch them in chain order
//!   - Advance the cursor and the latest-block gauge
//!
//! A failed tick leaves the cursor where it was, so the same range is
//! retried on the next tick.

use std::time::Duration;

use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use chainwatch_core::{BlockRange, Cursor, LogFilter, MAX_BLOCK_RANGE};

use crate::classifier::classify;
use crate::error::ExporterError;
use crate::handler::{HandlerContext, HandlerRegistry};

/// Poll loop settings.
#[derive(Debug, Clone)]
pub struct PollConfig {
    /// Time between two ticks.
    pub interval: Duration,
    /// Maximum blocks per `eth_getLogs` page.
    pub max_range: u64,
    /// Start here instead of at the current head.
    pub start_block: Option<u64>,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(30),
            max_range: MAX_BLOCK_RANGE,
            start_block: None,
        }
    }
}

/// What a single tick did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TickOutcome {
    /// The head has not moved past the cursor.
    Stale { head: u64, next_block: u64 },
    /// A range was fully processed.
    Processed {
        range: BlockRange,
        /// Classified logs dispatched.
        logs: usize,
        /// Logs skipped on decode errors.
        skipped: usize,
    },
}

pub struct PollLoop {
    ctx: HandlerContext,
    handlers: HandlerRegistry,
    cursor: Cursor,
    config: PollConfig,
}

impl PollLoop {
    /// Run the initializing phase and return a loop ready to tick.
    pub async fn start(
        ctx: HandlerContext,
        handlers: HandlerRegistry,
        config: PollConfig,
    ) -> Result<Self, ExporterError> {
        let env = ctx.env();
        ctx.metrics.seed_quorum_gauges(&ctx.roster, ctx.network());
        ctx.metrics.set_up(env, false);

        let start = match config.start_block {
            Some(block) => block,
            None => ctx.client.current_height().await?,
        };
        ctx.metrics.set_up(env, true);

        tracing::info!(
            deployment = %env,
            network = %ctx.network(),
            operators = ctx.roster.len(),
            start_block = start,
            interval_secs = config.interval.as_secs(),
            "running exporter"
        );

        Ok(Self {
            cursor: Cursor::with_max_range(start, config.max_range),
            ctx,
            handlers,
            config,
        })
    }

    /// The next block the loop will process.
    pub fn next_block(&self) -> u64 {
        self.cursor.next_block()
    }

    pub fn context(&self) -> &HandlerContext {
        &self.ctx
    }

    /// Process the next range, if any.
    ///
    /// Decode errors skip the offending log. A chain error aborts the tick
    /// before the cursor moves.
    pub async fn tick(&mut self) -> Result<TickOutcome, ExporterError> {
        let env = self.ctx.env();
        let head = self.ctx.client.current_height().await?;
        let Some(range) = self.cursor.next_range(head) else {
            tracing::debug!(
                deployment = %env,
                head,
                next_block = self.cursor.next_block(),
                "head not past cursor, waiting"
            );
            return Ok(TickOutcome::Stale {
                head,
                next_block: self.cursor.next_block(),
            });
        };
        if range.to < head {
            tracing::debug!(
                deployment = %env,
                head,
                range = %range,
                behind = head - range.to,
                "range capped to page size"
            );
        }

        let signatures = self.ctx.deployment.signatures();
        let filter = LogFilter {
            from_block: range.from,
            to_block: range.to,
            addresses: self.ctx.deployment.contract_addresses(),
            topic0: signatures.topics(),
        };
        tracing::debug!(deployment = %env, range = %range, "filtering logs");
        let raw = self.ctx.client.filter_logs(&filter).await?;
        let classified = classify(raw, signatures);

        let mut skipped = 0;
        for (log, kind) in &classified {
            match self.handlers.dispatch(*kind, log, &self.ctx).await {
                Ok(()) => {}
                Err(e) if e.is_decode() => {
                    skipped += 1;
                    tracing::warn!(
                        deployment = %env,
                        block = log.block_number,
                        tx_hash = %log.tx_hash,
                        event = %kind,
                        error = %e,
                        "skipping undecodable log"
                    );
                }
                Err(e) => return Err(e),
            }
        }

        self.cursor.advance_past(range);
        self.ctx.metrics.set_latest_block(self.ctx.network(), range.to);
        tracing::debug!(
            deployment = %env,
            range = %range,
            logs = classified.len(),
            skipped,
            "range processed"
        );
        Ok(TickOutcome::Processed {
            range,
            logs: classified.len(),
            skipped,
        })
    }

    /// Tick on a fixed interval until `cancel` fires. Tick failures are
    /// logged and retried on the next tick. Cancellation also interrupts a
    /// tick in flight; its range is simply not marked processed.
    pub async fn run(&mut self, cancel: CancellationToken) -> Result<(), ExporterError> {
        let env = self.ctx.env();
        let period = self.config.interval;
        let mut ticker = interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = ticker.tick() => {}
            }
            tokio::select! {
                _ = cancel.cancelled() => break,
                result = self.tick() => {
                    if let Err(e) = result {
                        tracing::error!(
                            deployment = %env,
                            next_block = self.cursor.next_block(),
                            error = %e,
                            "tick failed"
                        );
                    }
                }
            }
        }
        tracing::info!(deployment = %env, next_block = self.cursor.next_block(), "exporter stopped");
        Ok(())
    }
}
