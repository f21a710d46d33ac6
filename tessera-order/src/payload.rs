use tessera_shared::{
    Company, CompanyDetails, Contact, Masked, OrderedLicenseResult, SubmitResultRequest,
};

use crate::error::{OrderError, OrderResult};

pub const UNKNOWN_USER: &str = "Unknown User";

/// "{name} {surname}" from the company contact, or [`UNKNOWN_USER`]
pub fn user_name(contact: Option<&Contact>) -> String {
    let Some(contact) = contact else {
        return UNKNOWN_USER.to_string();
    };

    let full = format!("{} {}", contact.name.trim(), contact.surname.trim());
    match full.trim() {
        "" => UNKNOWN_USER.to_string(),
        name => name.to_string(),
    }
}

/// Build the submission and refuse to send one that is missing identity or lines
pub fn assemble_payload(
    company: &Company,
    details: &CompanyDetails,
    lines: Vec<OrderedLicenseResult>,
) -> OrderResult<SubmitResultRequest> {
    let company_name = match details.company.trim() {
        "" => company.company_name.trim(),
        name => name,
    };

    let payload = SubmitResultRequest {
        company_id: company.company_id.trim().to_string(),
        company_name: company_name.to_string(),
        user_login: Masked::new(details.login.expose().trim().to_string()),
        user_name: user_name(details.contact.as_ref()),
        ordered_license: lines
            .into_iter()
            .map(|line| OrderedLicenseResult {
                sku: line.sku.trim().to_string(),
                ..line
            })
            .collect(),
    };

    validate_payload(&payload)?;
    Ok(payload)
}

fn validate_payload(payload: &SubmitResultRequest) -> OrderResult<()> {
    let mut problems = Vec::new();
    if payload.company_id.is_empty() {
        problems.push("company id is empty");
    }
    if payload.user_login.expose().is_empty() {
        problems.push("user login is empty");
    }
    if payload.ordered_license.is_empty() {
        problems.push("no priced license lines");
    }

    if problems.is_empty() {
        Ok(())
    } else {
        Err(OrderError::business(format!(
            "Refusing to submit an incomplete result: {}",
            problems.join(", ")
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn company() -> Company {
        Company {
            company_id: " c-42 ".to_string(),
            company_name: " Lido Resolved ".to_string(),
        }
    }

    fn details(company: &str, login: &str, contact: Option<Contact>) -> CompanyDetails {
        CompanyDetails {
            company: company.to_string(),
            login: Masked::from(login),
            contact,
            licenses: vec![],
        }
    }

    fn line() -> OrderedLicenseResult {
        OrderedLicenseResult {
            sku: " TPLV7893-85 ".to_string(),
            price: dec!(100.00),
            count: 10,
            sum: dec!(1000.00),
        }
    }

    #[test]
    fn test_user_name_variants() {
        let jane = Contact { name: " Jane ".into(), surname: " Doe ".into() };
        assert_eq!(user_name(Some(&jane)), "Jane Doe");

        let only_surname = Contact { name: "  ".into(), surname: "Doe".into() };
        assert_eq!(user_name(Some(&only_surname)), "Doe");

        let blank = Contact { name: " ".into(), surname: "".into() };
        assert_eq!(user_name(Some(&blank)), UNKNOWN_USER);
        assert_eq!(user_name(None), UNKNOWN_USER);
    }

    #[test]
    fn test_fields_are_trimmed_and_details_name_preferred() {
        let payload = assemble_payload(
            &company(),
            &details(" LIDO ", " lido-admin ", None),
            vec![line()],
        )
        .unwrap();

        assert_eq!(payload.company_id, "c-42");
        assert_eq!(payload.company_name, "LIDO");
        assert_eq!(payload.user_login.expose(), "lido-admin");
        assert_eq!(payload.user_name, UNKNOWN_USER);
        assert_eq!(payload.ordered_license[0].sku, "TPLV7893-85");
    }

    #[test]
    fn test_falls_back_to_resolved_company_name() {
        let payload = assemble_payload(&company(), &details("  ", "lido-admin", None), vec![line()]).unwrap();
        assert_eq!(payload.company_name, "Lido Resolved");
    }

    #[test]
    fn test_blank_login_is_rejected() {
        let err = assemble_payload(&company(), &details("LIDO", "   ", None), vec![line()]).unwrap_err();
        assert!(err.is_business_rule());
        assert!(err.to_string().contains("user login"));
    }

    #[test]
    fn test_empty_lines_are_rejected() {
        let err = assemble_payload(&company(), &details("LIDO", "lido-admin", None), vec![]).unwrap_err();
        assert!(err.is_business_rule());
    }

    #[test]
    fn test_blank_company_id_is_rejected() {
        let blank = Company {
            company_id: "  ".to_string(),
            company_name: "LIDO".to_string(),
        };
        let err = assemble_payload(&blank, &details("LIDO", "lido-admin", None), vec![line()]).unwrap_err();
        assert!(err.to_string().contains("company id"));
    }
}
