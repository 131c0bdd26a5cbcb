/// Names whose count equals the highest count among `counts`.
///
/// Every tied name is returned. The order follows the iteration order of
/// `counts`, so callers that need a stable order have to sort.
pub fn most_active<'a, I>(counts: I) -> Vec<&'a str>
where
    I: IntoIterator<Item = (&'a str, u64)>,
{
    let mut result = Vec::new();
    let mut max = 0;
    for (name, count) in counts {
        if count > max {
            max = count;
            result.clear();
        }
        if count == max {
            result.push(name);
        }
    }
    result
}
