//! Stateless transaction rules shared by the executor and the pool.

use shared_types::{Address, Amount};

/// Bounds on delegate name length, in bytes.
pub const MIN_DELEGATE_NAME_LEN: usize = 3;
pub const MAX_DELEGATE_NAME_LEN: usize = 50;

/// Lower bound on a VM transaction's gas.
pub const MIN_VM_GAS: u64 = 21_000;

/// Upper bound on a VM transaction's gas price, in nano.
pub const MAX_VM_GAS_PRICE: u64 = i32::MAX as u64;

/// Addresses of the precompiled contracts.
pub const PRECOMPILES: [u8; 12] = [1, 2, 3, 4, 5, 6, 7, 8, 100, 101, 102, 103];

/// Voting precompiles with legacy behaviour before the upgrade fork.
pub const GET_VOTE_PRECOMPILE: u8 = 102;
pub const GET_VOTES_PRECOMPILE: u8 = 103;

/// Whether `name` is usable as a delegate name.
///
/// Only the length is enforced. Names are otherwise arbitrary bytes.
pub fn validate_delegate_name(name: &[u8]) -> bool {
    (MIN_DELEGATE_NAME_LEN..=MAX_DELEGATE_NAME_LEN).contains(&name.len())
}

/// The address of precompile `id`: nineteen zero bytes followed by `id`.
pub const fn precompile_address(id: u8) -> Address {
    let mut address = [0u8; 20];
    address[19] = id;
    address
}

/// The precompile id at `address`, if it is one.
pub fn precompile_id(address: &Address) -> Option<u8> {
    let (prefix, last) = address.split_at(19);
    if prefix.iter().all(|b| *b == 0) && PRECOMPILES.contains(&last[0]) {
        Some(last[0])
    } else {
        None
    }
}

/// Whether `gas` and `gas_price` are inside the VM bounds for a block
/// limited to `max_gas`.
pub fn vm_gas_in_bounds(gas: u64, gas_price: Amount, max_gas: u64) -> bool {
    (MIN_VM_GAS..=max_gas).contains(&gas) && (1..=MAX_VM_GAS_PRICE).contains(&gas_price.nano())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_delegate_name_length() {
        assert!(!validate_delegate_name(b"ab"));
        assert!(validate_delegate_name(b"abc"));
        assert!(validate_delegate_name(&[b'x'; 50]));
        assert!(!validate_delegate_name(&[b'x'; 51]));
        // The charset is not restricted.
        assert!(validate_delegate_name("Äbc-💡".as_bytes()));
    }

    #[test]
    fn test_precompile_addresses() {
        assert_eq!(precompile_id(&precompile_address(102)), Some(102));
        assert_eq!(precompile_id(&precompile_address(9)), None);
        let mut other = precompile_address(1);
        other[0] = 1;
        assert_eq!(precompile_id(&other), None);
    }

    #[test]
    fn test_vm_gas_bounds() {
        let max = 30_000_000;
        assert!(vm_gas_in_bounds(21_000, Amount::ONE, max));
        assert!(!vm_gas_in_bounds(20_999, Amount::ONE, max));
        assert!(!vm_gas_in_bounds(max + 1, Amount::ONE, max));
        assert!(!vm_gas_in_bounds(21_000, Amount::ZERO, max));
        assert!(!vm_gas_in_bounds(21_000, Amount::from_nano(MAX_VM_GAS_PRICE + 1), max));
    }
}
