use shared_types::{Address, Delegate};

/// Top `count` delegates by votes, ties broken by ascending address.
pub fn select_validators(mut delegates: Vec<Delegate>, count: usize) -> Vec<Address> {
    delegates.sort_by(|a, b| b.votes.cmp(&a.votes).then_with(|| a.address.cmp(&b.address)));
    delegates
        .into_iter()
        .take(count)
        .map(|delegate| delegate.address)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared_types::Amount;

    fn delegate(n: u8, votes: u64) -> Delegate {
        let mut d = Delegate::new([n; 20], vec![b'd', n], 0);
        d.votes = Amount::from_nano(votes);
        d
    }

    #[test]
    fn test_orders_by_votes_then_address() {
        let set = select_validators(
            vec![delegate(3, 10), delegate(1, 5), delegate(2, 10), delegate(4, 1)],
            3,
        );
        assert_eq!(set, vec![[2u8; 20], [3u8; 20], [1u8; 20]]);
    }

    #[test]
    fn test_fewer_delegates_than_slots() {
        assert_eq!(select_validators(vec![delegate(1, 0)], 6).len(), 1);
        assert!(select_validators(Vec::new(), 6).is_empty());
    }
}
