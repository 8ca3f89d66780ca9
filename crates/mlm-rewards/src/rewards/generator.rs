use std::sync::Arc;

use tracing::{debug, error, info, info_span};

use super::builder::{builder_for, RewardBuilder, RewardRates};
use super::clock::Clock;
use super::director::RewardDirector;
use super::domain::{Participant, RewardKind, RewardSubject, SubjectId};
use super::pocket::{Pocket, PocketItem};
use super::repository::{
    ProfiteerResolver, RepositoryError, ResolverError, RewardRepository, TransactionError,
    TransactionManager, TransactionScope,
};
use crate::config::RewardSettings;

/// Picks the builder a strategy uses for a subject.
pub(crate) type BuilderFactory = for<'a> fn(
    RewardKind,
    &'a dyn RewardSubject,
    &RewardRates,
) -> Box<dyn RewardBuilder + 'a>;

/// Runs the reward strategies for a subject and persists what they build.
pub struct RewardGenerator<R, T, P> {
    repository: Arc<R>,
    transactions: Arc<T>,
    resolver: Arc<P>,
    clock: Arc<dyn Clock>,
    director: RewardDirector,
    builders: BuilderFactory,
    settings: RewardSettings,
    rates: RewardRates,
}

impl<R, T, P> RewardGenerator<R, T, P>
where
    R: RewardRepository + 'static,
    T: TransactionManager + 'static,
    P: ProfiteerResolver + 'static,
{
    pub fn new(
        repository: Arc<R>,
        transactions: Arc<T>,
        resolver: Arc<P>,
        clock: Arc<dyn Clock>,
        settings: RewardSettings,
        rates: RewardRates,
    ) -> Self {
        let director = RewardDirector::new(clock.clone());
        Self {
            repository,
            transactions,
            resolver,
            clock,
            director,
            builders: builder_for,
            settings,
            rates,
        }
    }

    #[cfg(test)]
    pub(crate) fn with_builders(mut self, builders: BuilderFactory) -> Self {
        self.builders = builders;
        self
    }

    /// Generates every allowed reward for `subject`, returning how many were committed.
    pub fn generate_all(&self, subject: &dyn RewardSubject) -> usize {
        let mut pocket = Pocket::new();
        self.generate_all_into(subject, &mut pocket)
    }

    /// Like [`generate_all`](Self::generate_all), leaving the committed rewards in `pocket`.
    ///
    /// Strategies run basic, extra, custom, each in its own transaction. A failing
    /// strategy is rolled back, its pocket items are discarded and the next strategy
    /// still runs.
    pub fn generate_all_into(&self, subject: &dyn RewardSubject, pocket: &mut Pocket) -> usize {
        let subject_id = subject.subject_id();
        let span = info_span!("generate_all", key = %self.settings.log_key, subject = %subject_id);
        let _entered = span.enter();

        info!(at = %self.clock.now(), "generating rewards");

        pocket.clear();
        let baseline = pocket.size();

        for kind in RewardKind::ordered() {
            let mark = pocket.size();
            match self.generate_in_transaction(kind, subject, pocket) {
                Ok(Some(count)) => info!(%kind, count, "strategy committed"),
                Ok(None) => debug!(%kind, "strategy had nothing to generate"),
                Err(err) => {
                    pocket.rollback_to(mark);
                    error!(%kind, error = %err, "strategy rolled back");
                }
            }
        }

        let total = pocket.size_since(baseline);
        info!(total, "reward generation finished");
        total
    }

    /// Generates basic rewards. `Ok(None)` means nothing was attempted.
    pub fn generate_basic(
        &self,
        subject: &dyn RewardSubject,
    ) -> Result<Option<usize>, GenerationError> {
        self.generate_kind(RewardKind::Basic, subject)
    }

    pub fn generate_extra(
        &self,
        subject: &dyn RewardSubject,
    ) -> Result<Option<usize>, GenerationError> {
        self.generate_kind(RewardKind::Extra, subject)
    }

    pub fn generate_custom(
        &self,
        subject: &dyn RewardSubject,
    ) -> Result<Option<usize>, GenerationError> {
        self.generate_kind(RewardKind::Custom, subject)
    }

    /// Runs one strategy outside any transaction; the caller owns the boundary.
    pub fn generate_kind(
        &self,
        kind: RewardKind,
        subject: &dyn RewardSubject,
    ) -> Result<Option<usize>, GenerationError> {
        let mut pocket = Pocket::new();
        self.generate_kind_into(kind, subject, &mut pocket)
    }

    fn generate_in_transaction(
        &self,
        kind: RewardKind,
        subject: &dyn RewardSubject,
        pocket: &mut Pocket,
    ) -> Result<Option<usize>, GenerationError> {
        let scope = TransactionScope::begin(self.transactions.as_ref())?;
        let generated = self.generate_kind_into(kind, subject, pocket)?;
        scope.commit()?;
        Ok(generated)
    }

    fn generate_kind_into(
        &self,
        kind: RewardKind,
        subject: &dyn RewardSubject,
        pocket: &mut Pocket,
    ) -> Result<Option<usize>, GenerationError> {
        if !subject.can_reward_by(kind) {
            info!(%kind, at = %self.clock.now(), "strategy prevented for subject");
            return Ok(None);
        }

        info!(%kind, at = %self.clock.now(), "generating strategy rewards");

        let mut builder = (self.builders)(kind, subject, &self.rates);
        let profiteers = self.resolver.profiteers(kind, subject)?;

        self.generate(builder.as_mut(), &profiteers, pocket)
    }

    fn generate(
        &self,
        builder: &mut dyn RewardBuilder,
        profiteers: &[Participant],
        pocket: &mut Pocket,
    ) -> Result<Option<usize>, GenerationError> {
        if profiteers.is_empty() {
            return Ok(None);
        }

        let mark = pocket.size();

        for participant in profiteers {
            let Some(reward) = self.director.build(builder, participant) else {
                return Err(GenerationError::builder(
                    builder,
                    "builder produced no result",
                    None,
                ));
            };

            if reward.is_worthless() && self.settings.skip_worthless {
                info!(reward = %reward.log_record(), "reward skipped as worthless");
                continue;
            }

            let saved = self.repository.save(reward).map_err(|source| {
                GenerationError::builder(builder, "not able to save builder result", Some(source))
            })?;

            debug!(reward = %saved.log_record(), "reward created");
            pocket.add(PocketItem::new(saved));
        }

        Ok(Some(pocket.size_since(mark)))
    }
}

/// Failure of one strategy run. Inside `generate_all` it rolls back that strategy only.
#[derive(Debug, thiserror::Error)]
pub enum GenerationError {
    #[error("{kind} reward builder for subject {subject} failed: {message}")]
    Builder {
        kind: RewardKind,
        subject: SubjectId,
        message: String,
        source: Option<RepositoryError>,
    },
    #[error(transparent)]
    Transaction(#[from] TransactionError),
    #[error(transparent)]
    Resolver(#[from] ResolverError),
}

impl GenerationError {
    fn builder(
        builder: &dyn RewardBuilder,
        message: &str,
        source: Option<RepositoryError>,
    ) -> Self {
        Self::Builder {
            kind: builder.kind(),
            subject: builder.subject_id(),
            message: message.to_string(),
            source,
        }
    }
}
