//! Echo agent — spaced re-practice of missed facts.
//!
//! Lifecycle of an entry:
//!
//! ```text
//!   miss ──▶ Scheduled ──(question_number >= due_at)──▶ Due ──▶ presented
//!              ▲   ▲                                             │
//!              │   └──── hit, below threshold (rehearsal delay) ─┤
//!              └──────── miss (longer backoff, hits reset) ──────┤
//!                                                                ▼
//!                                                  hits == threshold: Resolved
//! ```
//!
//! One entry per fact. Resolved entries leave the queue and survive only as
//! a count.

use mathtier_config::EchoConfig;
use mathtier_core::{ContentItem, FactKey};
use serde::{Deserialize, Serialize};
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EchoStatus {
    Scheduled,
    Due,
    Resolved,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EchoQueueEntry {
    pub item: ContentItem,
    pub status: EchoStatus,
    pub enqueued_at_question: u32,
    pub due_at_question: u32,
    pub misses: u32,
    pub hits: u32,
}

/// What happened to the queue after an answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EchoOutcome {
    /// Nothing to do for this answer.
    Unchanged,
    /// A new fact entered the queue.
    Enqueued { due_at_question: u32 },
    /// A queued fact was missed again and pushed back further.
    Rescheduled { misses: u32, due_at_question: u32 },
    /// A due fact was answered correctly but needs more repetitions.
    Progressed { hits: u32, due_at_question: u32 },
    /// A fact reached the hit threshold and left the queue.
    Resolved,
}

/// What the echo agent contributes to the directive envelope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EchoDirective {
    pub queue_size: usize,
    pub due_count: usize,
    pub resolved_count: u32,
    pub presented_echo: bool,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct EchoAgent {
    entries: Vec<EchoQueueEntry>,
    resolved_count: u32,
}

/// Backoff: `base × 2^(misses-1)`, capped at `max_delay`.
pub fn delay_for(misses: u32, config: &EchoConfig) -> u32 {
    let exponent = misses.saturating_sub(1).min(16);
    config
        .base_delay
        .saturating_mul(1u32 << exponent)
        .min(config.max_delay)
}

impl EchoAgent {
    pub fn new() -> Self {
        Self::default()
    }

    fn position(&self, fact: &FactKey) -> Option<usize> {
        self.entries.iter().position(|e| &e.item.fact() == fact)
    }

    /// Record a wrong answer to `item` at `question_number`.
    pub fn record_miss(
        &mut self,
        item: &ContentItem,
        question_number: u32,
        config: &EchoConfig,
    ) -> EchoOutcome {
        if let Some(idx) = self.position(&item.fact()) {
            let entry = &mut self.entries[idx];
            entry.misses += 1;
            entry.hits = 0;
            entry.status = EchoStatus::Scheduled;
            entry.due_at_question = question_number + delay_for(entry.misses, config);
            debug!(
                fact = %entry.item.equation(),
                misses = entry.misses,
                due_at = entry.due_at_question,
                "Echo entry rescheduled"
            );
            return EchoOutcome::Rescheduled {
                misses: entry.misses,
                due_at_question: entry.due_at_question,
            };
        }

        if self.entries.len() >= config.max_entries.max(1) {
            self.evict_oldest();
        }

        let due_at_question = question_number + delay_for(1, config);
        self.entries.push(EchoQueueEntry {
            item: item.clone(),
            status: EchoStatus::Scheduled,
            enqueued_at_question: question_number,
            due_at_question,
            misses: 1,
            hits: 0,
        });
        debug!(fact = %item.equation(), due_at = due_at_question, "Echo entry enqueued");
        EchoOutcome::Enqueued { due_at_question }
    }

    /// Record a correct answer. Only counts toward resolution when the
    /// fact was presented as a due echo item.
    pub fn record_hit(
        &mut self,
        fact: &FactKey,
        question_number: u32,
        config: &EchoConfig,
    ) -> EchoOutcome {
        let Some(idx) = self.position(fact) else {
            return EchoOutcome::Unchanged;
        };
        if self.entries[idx].status != EchoStatus::Due {
            return EchoOutcome::Unchanged;
        }

        let entry = &mut self.entries[idx];
        entry.hits += 1;
        if entry.hits >= config.resolve_threshold {
            entry.status = EchoStatus::Resolved;
            debug!(fact = %entry.item.equation(), "Echo entry resolved");
            self.entries.retain(|e| e.status != EchoStatus::Resolved);
            self.resolved_count += 1;
            return EchoOutcome::Resolved;
        }

        entry.status = EchoStatus::Scheduled;
        entry.due_at_question = question_number + config.rehearsal_delay;
        EchoOutcome::Progressed {
            hits: entry.hits,
            due_at_question: entry.due_at_question,
        }
    }

    /// Pop the most overdue scheduled entry for presentation, flipping it to
    /// `Due`. Entries whose due question has not arrived stay put.
    pub fn take_due(&mut self, question_number: u32) -> Option<ContentItem> {
        let entry = self
            .entries
            .iter_mut()
            .filter(|e| e.status == EchoStatus::Scheduled && e.due_at_question <= question_number)
            .min_by_key(|e| (e.due_at_question, e.enqueued_at_question))?;
        entry.status = EchoStatus::Due;
        Some(entry.item.clone())
    }

    /// Return a presented but unanswered entry to `Scheduled`, keeping its
    /// due question so it is eligible again right away.
    pub fn requeue(&mut self, fact: &FactKey) -> bool {
        match self.entries.iter_mut().find(|e| e.item.fact() == *fact) {
            Some(entry) if entry.status == EchoStatus::Due => {
                entry.status = EchoStatus::Scheduled;
                true
            }
            _ => false,
        }
    }

    fn evict_oldest(&mut self) {
        let victim = self
            .entries
            .iter()
            .enumerate()
            .filter(|(_, e)| e.status == EchoStatus::Scheduled)
            .min_by_key(|(_, e)| e.enqueued_at_question)
            .or_else(|| self.entries.iter().enumerate().min_by_key(|(_, e)| e.enqueued_at_question))
            .map(|(idx, _)| idx);
        if let Some(idx) = victim {
            let evicted = self.entries.remove(idx);
            debug!(fact = %evicted.item.equation(), "Echo queue full, evicted oldest entry");
        }
    }

    pub fn entry(&self, fact: &FactKey) -> Option<&EchoQueueEntry> {
        self.position(fact).map(|idx| &self.entries[idx])
    }

    pub fn scheduled(&self) -> Vec<&EchoQueueEntry> {
        self.entries.iter().filter(|e| e.status == EchoStatus::Scheduled).collect()
    }

    pub fn due(&self) -> Vec<&EchoQueueEntry> {
        self.entries.iter().filter(|e| e.status == EchoStatus::Due).collect()
    }

    /// Active (scheduled or due) entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn resolved_count(&self) -> u32 {
        self.resolved_count
    }

    pub fn directive(&self, question_number: u32, presented_echo: bool) -> EchoDirective {
        let due_count = self
            .entries
            .iter()
            .filter(|e| e.status == EchoStatus::Due || e.due_at_question <= question_number)
            .count();
        EchoDirective {
            queue_size: self.entries.len(),
            due_count,
            resolved_count: self.resolved_count,
            presented_echo,
        }
    }
}
