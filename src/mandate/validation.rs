use crate::errors::ValidationErrors;
use crate::types::{BankDetails, ClientSnapshot, ACTIVE_CLIENT_STATUS_HANDLE, ACTIVE_FEE_PAYER_STATUS};

pub const ACCOUNT_NAME_MAX_LEN: usize = 18;
pub const ADDRESS_LINE_MAX_LEN: usize = 40;
pub const POST_CODE_MAX_LEN: usize = 10;

/// shape checks on caller-supplied bank details
///
/// Each field reports at most one rule: `required`, then its format rule.
pub fn validate_bank_details(details: &BankDetails) -> ValidationErrors {
    let mut errors = ValidationErrors::new();

    if details.account_name.is_empty() {
        errors.add("AccountName", "required");
    } else if details.account_name.chars().count() > ACCOUNT_NAME_MAX_LEN {
        errors.add("AccountName", "gteEighteen");
    }

    if details.sort_code.is_empty() {
        errors.add("SortCode", "required");
    } else if !is_sort_code(&details.sort_code) {
        errors.add("SortCode", "len");
    } else if details.sort_code.chars().all(|c| c == '0' || c == '-') {
        errors.add("SortCode", "zero");
    }

    if details.account_number.is_empty() {
        errors.add("AccountNumber", "required");
    } else if !(details.account_number.len() == 8
        && details.account_number.bytes().all(|b| b.is_ascii_digit()))
    {
        errors.add("AccountNumber", "len");
    }

    errors
}

/// eligibility and address checks against the case record
///
/// Every rule is checked; failures accumulate.
pub fn validate_eligibility(client: &ClientSnapshot) -> ValidationErrors {
    let mut errors = ValidationErrors::new();

    let fee_payer_active = client
        .fee_payer
        .as_ref()
        .is_some_and(|fee_payer| fee_payer.status == ACTIVE_FEE_PAYER_STATUS);
    if !fee_payer_active {
        errors.add("FeePayer", "inactive");
    }

    if client.active_case_type.is_none() {
        errors.add("ActiveOrder", "required");
    }

    let client_active = client
        .client_status
        .as_ref()
        .is_some_and(|status| status.handle == ACTIVE_CLIENT_STATUS_HANDLE);
    if !client_active {
        errors.add("ClientStatus", "inactive");
    }

    if !within(&client.address_line1, ADDRESS_LINE_MAX_LEN) {
        errors.add("AddressLine1", "required");
    }
    if !within(&client.town, ADDRESS_LINE_MAX_LEN) {
        errors.add("Town", "required");
    }
    if !within(&client.post_code, POST_CODE_MAX_LEN) {
        errors.add("PostCode", "required");
    }

    errors
}

/// `NN-NN-NN`
fn is_sort_code(value: &str) -> bool {
    let bytes = value.as_bytes();
    bytes.len() == 8
        && bytes.iter().enumerate().all(|(i, b)| {
            if i == 2 || i == 5 {
                *b == b'-'
            } else {
                b.is_ascii_digit()
            }
        })
}

fn within(value: &str, max: usize) -> bool {
    let len = value.chars().count();
    len > 0 && len <= max
}
