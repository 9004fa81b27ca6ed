use solana_address_lookup_table_interface::state::AddressLookupTable;
use solana_sdk::message::AddressLookupTableAccount;
use solana_sdk::pubkey::Pubkey;

use super::error::{ConnectionError, ConnectionResult};

pub fn deserialize_lookup_table(
    address: &Pubkey,
    data: &[u8],
) -> ConnectionResult<AddressLookupTableAccount> {
    AddressLookupTable::deserialize(data)
        .map(|table| AddressLookupTableAccount {
            key: *address,
            addresses: table.addresses.into_owned(),
        })
        .map_err(|err| ConnectionError::LookupTableDecode {
            address: *address,
            reason: err.to_string(),
        })
}
