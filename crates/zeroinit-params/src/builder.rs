//! The [`ParamsBuilder`] pipeline.
//!
//! Every stage consumes the builder and returns a new one wrapping the previous
//! generator, so a pipeline is an immutable chain of lazily evaluated
//! transformations. Nothing is enumerated until [`ParamsBuilder::iter`] is
//! called, and each call starts a fresh traversal.

use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use zeroinit_core::profiling::profile_function;

use crate::tuple::{Append, ParamValues};

/// Stage marker: axes added now are case axes.
#[derive(Debug, Clone, Copy)]
pub struct Cases;

/// Stage marker: [`ParamsBuilder::begin_subcases`] has been called.
#[derive(Debug, Clone, Copy)]
pub struct Subcases;

type Records<P> = Box<dyn Iterator<Item = P> + Send>;
type Source<P> = Arc<dyn Fn() -> Records<P> + Send + Sync>;

/// Lazy combinatorial expander over flat tuple records.
pub struct ParamsBuilder<P, Stage = Cases> {
    axes: Vec<&'static str>,
    subcase_start: Option<usize>,
    source: Source<P>,
    _stage: PhantomData<Stage>,
}

impl<P, Stage> Clone for ParamsBuilder<P, Stage> {
    fn clone(&self) -> Self {
        Self {
            axes: self.axes.clone(),
            subcase_start: self.subcase_start,
            source: Arc::clone(&self.source),
            _stage: PhantomData,
        }
    }
}

impl<P, Stage> fmt::Debug for ParamsBuilder<P, Stage> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ParamsBuilder")
            .field("axes", &self.axes)
            .field("subcase_start", &self.subcase_start)
            .finish_non_exhaustive()
    }
}

impl ParamsBuilder<(), Cases> {
    /// A pipeline yielding the single empty record.
    pub fn new() -> Self {
        Self {
            axes: Vec::new(),
            subcase_start: None,
            source: Arc::new(|| Box::new(std::iter::once(())) as Records<()>),
            _stage: PhantomData,
        }
    }
}

impl Default for ParamsBuilder<(), Cases> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P> ParamsBuilder<P, Cases>
where
    P: Clone + Send + 'static,
{
    /// Mark every axis declared from here on as a subcase axis.
    ///
    /// Only callable once: the returned builder has no `begin_subcases`.
    pub fn begin_subcases(self) -> ParamsBuilder<P, Subcases> {
        ParamsBuilder {
            subcase_start: Some(self.axes.len()),
            axes: self.axes,
            source: self.source,
            _stage: PhantomData,
        }
    }
}

impl<P, Stage> ParamsBuilder<P, Stage>
where
    P: Clone + Send + 'static,
{
    fn chain<Q>(self, axis: Option<&'static str>, source: Source<Q>) -> ParamsBuilder<Q, Stage> {
        let mut axes = self.axes;
        axes.extend(axis);
        ParamsBuilder {
            axes,
            subcase_start: self.subcase_start,
            source,
            _stage: PhantomData,
        }
    }

    /// Append an axis whose values do not depend on earlier axes.
    pub fn combine<V>(
        self,
        axis: &'static str,
        values: impl IntoIterator<Item = V>,
    ) -> ParamsBuilder<P::Output, Stage>
    where
        V: Clone + Send + Sync + 'static,
        P: Append<V>,
        P::Output: Send + 'static,
    {
        let values: Arc<[V]> = values.into_iter().collect();
        let prev = Arc::clone(&self.source);
        let source: Source<P::Output> = Arc::new(move || {
            let values = Arc::clone(&values);
            Box::new(prev().flat_map(move |record| {
                let values = Arc::clone(&values);
                (0..values.len()).map(move |i| record.clone().append(values[i].clone()))
            })) as Records<_>
        });
        self.chain(Some(axis), source)
    }

    /// Append an axis whose legal values are computed from the bound prefix.
    pub fn expand<V, I, F>(self, axis: &'static str, values: F) -> ParamsBuilder<P::Output, Stage>
    where
        V: Send + 'static,
        I: IntoIterator<Item = V>,
        F: Fn(&P) -> I + Send + Sync + 'static,
        P: Append<V>,
        P::Output: Send + 'static,
    {
        let values = Arc::new(values);
        let prev = Arc::clone(&self.source);
        let source: Source<P::Output> = Arc::new(move || {
            let values = Arc::clone(&values);
            Box::new(prev().flat_map(move |record| {
                let bound: Vec<V> = values(&record).into_iter().collect();
                bound.into_iter().map(move |v| record.clone().append(v))
            })) as Records<_>
        });
        self.chain(Some(axis), source)
    }

    /// Append an axis of literal bundles that vary together.
    ///
    /// Each bundle is one element of the record, so `(mips, layers)` pairs are
    /// enumerated as given rather than as a cross product.
    pub fn combine_with_params<B>(
        self,
        axis: &'static str,
        bundles: impl IntoIterator<Item = B>,
    ) -> ParamsBuilder<P::Output, Stage>
    where
        B: Clone + Send + Sync + 'static,
        P: Append<B>,
        P::Output: Send + 'static,
    {
        self.combine(axis, bundles)
    }

    /// Drop every record for which `predicate` holds.
    pub fn unless<F>(self, predicate: F) -> Self
    where
        F: Fn(&P) -> bool + Send + Sync + 'static,
    {
        self.filter(move |record| !predicate(record))
    }

    /// Keep only records for which `predicate` holds.
    pub fn filter<F>(self, predicate: F) -> Self
    where
        F: Fn(&P) -> bool + Send + Sync + 'static,
    {
        let predicate = Arc::new(predicate);
        let prev = Arc::clone(&self.source);
        let source: Source<P> = Arc::new(move || {
            let predicate = Arc::clone(&predicate);
            Box::new(prev().filter(move |record| predicate(record))) as Records<_>
        });
        self.chain(None, source)
    }

    /// A fresh traversal of every surviving record.
    pub fn iter(&self) -> Records<P> {
        (self.source)()
    }

    /// Number of surviving records. Walks the whole matrix.
    pub fn count(&self) -> usize {
        profile_function!();
        self.iter().count()
    }

    pub fn axes(&self) -> &[&'static str] {
        &self.axes
    }

    pub fn case_axes(&self) -> &[&'static str] {
        &self.axes[..self.split()]
    }

    pub fn subcase_axes(&self) -> &[&'static str] {
        &self.axes[self.split()..]
    }

    fn split(&self) -> usize {
        self.subcase_start.unwrap_or(self.axes.len())
    }

    /// Axis names in order, with `|` at the case/subcase boundary.
    pub fn describe(&self) -> String {
        let cases = self.case_axes().join(", ");
        match self.subcase_start {
            Some(_) => format!("{cases} | {}", self.subcase_axes().join(", ")),
            None => cases,
        }
    }
}

impl<P, Stage> ParamsBuilder<P, Stage>
where
    P: Clone + Send + ParamValues + 'static,
{
    fn render(axes: &[&'static str], values: &[String]) -> String {
        axes.iter()
            .zip(values)
            .map(|(axis, value)| format!("{axis}={value}"))
            .collect::<Vec<_>>()
            .join(";")
    }

    /// `axis=value` pairs for the case axes of `record`, joined by `;`.
    pub fn case_key(&self, record: &P) -> String {
        let values = record.values();
        let split = self.split().min(values.len());
        Self::render(self.case_axes(), &values[..split])
    }

    /// `axis=value` pairs for the subcase axes of `record`, joined by `;`.
    pub fn subcase_key(&self, record: &P) -> String {
        let values = record.values();
        let split = self.split().min(values.len());
        Self::render(self.subcase_axes(), &values[split..])
    }

    /// Records grouped under their case key, in enumeration order.
    ///
    /// Consecutive records sharing a case key form one group; because subcase
    /// axes are always bound after case axes, each key appears exactly once.
    pub fn grouped(&self) -> Vec<(String, Vec<P>)> {
        profile_function!();
        let mut groups: Vec<(String, Vec<P>)> = Vec::new();
        for record in self.iter() {
            let key = self.case_key(&record);
            match groups.last_mut() {
                Some((last, members)) if *last == key => members.push(record),
                _ => groups.push((key, vec![record])),
            }
        }
        groups
    }
}
