/// Folds independently-fallible results into one result.
///
/// Succeeds with every success, in order, only when nothing failed. Otherwise
/// fails with every failure, in order; no failure is dropped in favour of the
/// first.
pub fn collect_all<T, E, I>(results: I) -> Result<Vec<T>, Vec<E>>
where
    I: IntoIterator<Item = Result<T, E>>,
{
    let mut successes = Vec::new();
    let mut failures = Vec::new();

    for result in results {
        match result {
            Ok(value) => successes.push(value),
            Err(error) => failures.push(error),
        }
    }

    if failures.is_empty() {
        Ok(successes)
    } else {
        Err(failures)
    }
}

/// Method form of [`collect_all`] for iterators of results
pub trait CollectAll<T, E>: Iterator<Item = Result<T, E>> + Sized {
    fn collect_all(self) -> Result<Vec<T>, Vec<E>> {
        collect_all(self)
    }
}

impl<T, E, I> CollectAll<T, E> for I where I: Iterator<Item = Result<T, E>> {}
