use std::sync::LazyLock;

use crate::models::FormKind;

use super::schema::{FieldDef as F, FormSchema, Step};

static CATALOG: LazyLock<Vec<FormSchema>> =
    LazyLock::new(|| FormKind::ALL.into_iter().map(build).collect());

/// The wizard definition behind a public form.
pub fn schema(kind: FormKind) -> &'static FormSchema {
    // CATALOG is built from FormKind::ALL in the same order
    let index = FormKind::ALL
        .iter()
        .position(|k| *k == kind)
        .unwrap_or_default();
    &CATALOG[index]
}

pub fn all() -> &'static [FormSchema] {
    &CATALOG
}

const PARISH_STATUS: &[&str] = &["Registered parishioner", "Visitor", "Not yet registered"];

fn contact_step() -> Step {
    Step::new(
        "contact",
        "Contact Details",
        vec![
            F::text("contact_name", "Your Name").required(),
            F::email("email", "Email Address").required(),
            F::phone("phone", "Phone Number").required(),
            F::select("parish_status", "Parish Membership", PARISH_STATUS).required(),
        ],
    )
}

fn consent_step() -> Step {
    Step::new(
        "review",
        "Review & Consent",
        vec![
            F::textarea("additional_notes", "Anything else we should know?"),
            F::boolean("consent", "I confirm the information provided is accurate").required(),
        ],
    )
}

fn build(kind: FormKind) -> FormSchema {
    let (description, steps) = match kind {
        FormKind::Baptism => (
            "Request the Sacrament of Baptism for a child.",
            vec![
                Step::new(
                    "child",
                    "Child",
                    vec![
                        F::text("child_first_name", "Child's First Name").required(),
                        F::text("child_middle_name", "Child's Middle Name"),
                        F::text("child_last_name", "Child's Last Name").required(),
                        F::date("child_birth_date", "Date of Birth").required(),
                        F::text("child_birth_place", "Place of Birth").required(),
                        F::select("child_gender", "Gender", &["Male", "Female"]).required(),
                    ],
                ),
                Step::new(
                    "parents",
                    "Parents",
                    vec![
                        F::text("father_name", "Father's Full Name").required(),
                        F::text("mother_maiden_name", "Mother's Full Maiden Name").required(),
                        F::boolean("parents_married_in_church", "Parents were married in the Church"),
                    ],
                ),
                Step::new(
                    "godparents",
                    "Godparents",
                    vec![
                        F::text("godfather_name", "Godfather's Full Name"),
                        F::text("godmother_name", "Godmother's Full Name"),
                        F::boolean("godparents_confirmed", "Godparents are confirmed Catholics")
                            .required(),
                        F::file("godparent_certificate", "Godparent Sponsor Certificate")
                            .help("PDF or image, issued by the godparent's parish"),
                    ],
                ),
                Step::new(
                    "schedule",
                    "Preferred Schedule",
                    vec![
                        F::date("preferred_date", "Preferred Baptism Date").required(),
                        F::boolean("seminar_attended", "Parents attended the pre-baptism seminar"),
                    ],
                ),
                contact_step(),
                consent_step(),
            ],
        ),
        FormKind::FirstCommunion => (
            "Register a child for First Holy Communion preparation.",
            vec![
                Step::new(
                    "child",
                    "Child",
                    vec![
                        F::text("child_full_name", "Child's Full Name").required(),
                        F::date("child_birth_date", "Date of Birth").required(),
                        F::text("school", "School"),
                        F::text("grade", "Grade"),
                    ],
                ),
                Step::new(
                    "baptism",
                    "Baptism Record",
                    vec![
                        F::text("baptism_parish", "Parish of Baptism").required(),
                        F::date("baptism_date", "Date of Baptism").required(),
                        F::file("baptism_certificate", "Baptismal Certificate"),
                    ],
                ),
                contact_step(),
                consent_step(),
            ],
        ),
        FormKind::Confirmation => (
            "Register a candidate for the Sacrament of Confirmation.",
            vec![
                Step::new(
                    "candidate",
                    "Candidate",
                    vec![
                        F::text("candidate_full_name", "Candidate's Full Name").required(),
                        F::date("candidate_birth_date", "Date of Birth").required(),
                        F::text("confirmation_name", "Chosen Confirmation Name"),
                    ],
                ),
                Step::new(
                    "sacraments",
                    "Sacramental Records",
                    vec![
                        F::text("baptism_parish", "Parish of Baptism").required(),
                        F::date("baptism_date", "Date of Baptism").required(),
                        F::boolean("received_first_communion", "Candidate has received First Holy Communion")
                            .required(),
                        F::file("baptism_certificate", "Baptismal Certificate").required(),
                    ],
                ),
                Step::new(
                    "sponsor",
                    "Sponsor",
                    vec![
                        F::text("sponsor_name", "Sponsor's Full Name").required(),
                        F::boolean("sponsor_confirmed", "Sponsor is a confirmed, practising Catholic")
                            .required(),
                    ],
                ),
                contact_step(),
                consent_step(),
            ],
        ),
        FormKind::Wedding => (
            "Begin preparation for the Sacrament of Holy Matrimony.",
            vec![
                Step::new(
                    "groom",
                    "Groom",
                    vec![
                        F::text("groom_full_name", "Groom's Full Name").required(),
                        F::date("groom_birth_date", "Groom's Date of Birth").required(),
                        F::select("groom_religion", "Groom's Religion", &["Catholic", "Other Christian", "Other", "None"])
                            .required(),
                        F::email("groom_email", "Groom's Email"),
                    ],
                ),
                Step::new(
                    "bride",
                    "Bride",
                    vec![
                        F::text("bride_full_name", "Bride's Full Name").required(),
                        F::date("bride_birth_date", "Bride's Date of Birth").required(),
                        F::select("bride_religion", "Bride's Religion", &["Catholic", "Other Christian", "Other", "None"])
                            .required(),
                        F::email("bride_email", "Bride's Email"),
                    ],
                ),
                Step::new(
                    "history",
                    "Marital History",
                    vec![F::boolean("previously_married", "Either party has been married before")],
                ),
                Step::new(
                    "annulment",
                    "Previous Marriage",
                    vec![
                        F::textarea("previous_marriage_details", "Details of the previous marriage").required(),
                        F::select("annulment_status", "Declaration of Nullity", &["Granted", "In progress", "Not started"])
                            .required(),
                    ],
                )
                .shown_when("previously_married", "true"),
                Step::new(
                    "ceremony",
                    "Ceremony",
                    vec![
                        F::date("preferred_date", "Preferred Wedding Date").required(),
                        F::select("preferred_time", "Preferred Time", &["Morning", "Afternoon", "Evening"]),
                        F::number("expected_guests", "Expected Number of Guests"),
                    ],
                ),
                contact_step(),
                consent_step(),
            ],
        ),
        FormKind::Anointing => (
            "Request a priest visit for the Anointing of the Sick.",
            vec![
                Step::new(
                    "patient",
                    "Person to be Anointed",
                    vec![
                        F::text("patient_name", "Full Name").required(),
                        F::text("location", "Address, Hospital or Care Home").required(),
                        F::text("room", "Room or Ward"),
                        F::boolean("is_urgent", "Death may be imminent"),
                    ],
                ),
                Step::new(
                    "visit",
                    "Visit",
                    vec![
                        F::date("preferred_date", "Preferred Visit Date"),
                        F::textarea("condition_notes", "Condition and special requests"),
                    ],
                ),
                contact_step(),
                consent_step(),
            ],
        ),
        FormKind::Funeral => (
            "Arrange a Funeral Mass for a loved one.",
            vec![
                Step::new(
                    "deceased",
                    "The Deceased",
                    vec![
                        F::text("deceased_name", "Full Name of the Deceased").required(),
                        F::date("date_of_death", "Date of Death").required(),
                        F::date("deceased_birth_date", "Date of Birth"),
                        F::boolean("was_parishioner", "The deceased was a parishioner"),
                    ],
                ),
                Step::new(
                    "arrangements",
                    "Arrangements",
                    vec![
                        F::text("funeral_home", "Funeral Home").required(),
                        F::date("preferred_date", "Preferred Funeral Date").required(),
                        F::select("burial_type", "Burial or Cremation", &["Burial", "Cremation", "Undecided"])
                            .required(),
                        F::text("cemetery", "Cemetery"),
                    ],
                ),
                contact_step(),
                consent_step(),
            ],
        ),
        FormKind::Donation => (
            "Support the parish and upload proof of your payment.",
            vec![
                Step::new(
                    "donor",
                    "Donor",
                    vec![
                        F::text("donor_name", "Full Name").required(),
                        F::email("email", "Email Address").required(),
                        F::phone("phone", "Phone Number"),
                        F::boolean("anonymous", "Keep my donation anonymous"),
                    ],
                ),
                Step::new(
                    "gift",
                    "Gift",
                    vec![
                        F::number("amount", "Amount").required(),
                        F::select("purpose", "Purpose", &["General Fund", "Building Fund", "Charity Outreach", "Mass Offering", "Other"])
                            .required(),
                        F::select("payment_method", "Payment Method", &["Bank Transfer", "Mobile Wallet", "Cash", "Check"])
                            .required(),
                        F::text("reference_number", "Transaction Reference"),
                    ],
                ),
                Step::new(
                    "proof",
                    "Proof of Payment",
                    vec![F::file("proof_of_payment", "Receipt or Screenshot").required()],
                ),
            ],
        ),
        FormKind::Volunteer => (
            "Offer your time to one of the parish ministries.",
            vec![
                Step::new(
                    "applicant",
                    "About You",
                    vec![
                        F::text("full_name", "Full Name").required(),
                        F::email("email", "Email Address").required(),
                        F::phone("phone", "Phone Number").required(),
                        F::date("birth_date", "Date of Birth"),
                    ],
                ),
                Step::new(
                    "ministry",
                    "Ministry",
                    vec![
                        F::select(
                            "ministry",
                            "Preferred Ministry",
                            &["Choir", "Lectors", "Altar Servers", "Catechists", "Hospitality", "Youth Ministry", "Social Outreach"],
                        )
                        .required(),
                        F::select("availability", "Availability", &["Weekdays", "Weekends", "Both"]).required(),
                        F::textarea("experience", "Relevant Experience"),
                    ],
                ),
                Step::new(
                    "agreement",
                    "Agreement",
                    vec![F::boolean("code_of_conduct", "I agree to the parish safeguarding code of conduct").required()],
                ),
            ],
        ),
        FormKind::Membership => (
            "Register your household with the parish.",
            vec![
                Step::new(
                    "household",
                    "Household",
                    vec![
                        F::text("head_of_household", "Head of Household").required(),
                        F::text("address", "Home Address").required(),
                        F::email("email", "Email Address").required(),
                        F::phone("phone", "Phone Number").required(),
                        F::number("household_size", "Number of People in Household").required(),
                    ],
                ),
                Step::new(
                    "faith",
                    "Faith Life",
                    vec![
                        F::text("previous_parish", "Previous Parish"),
                        F::boolean("all_baptized", "All members of the household are baptized"),
                        F::textarea("ministry_interests", "Ministries you may be interested in"),
                    ],
                ),
                Step::new(
                    "agreement",
                    "Agreement",
                    vec![F::boolean("consent", "I consent to the parish keeping these records").required()],
                ),
            ],
        ),
        FormKind::Contact => (
            "Send a message to the parish office.",
            vec![Step::new(
                "message",
                "Message",
                vec![
                    F::text("name", "Your Name").required(),
                    F::email("email", "Email Address").required(),
                    F::phone("phone", "Phone Number"),
                    F::text("subject", "Subject").required(),
                    F::textarea("message", "Message").required(),
                ],
            )],
        ),
        FormKind::MassIntention => (
            "Request that a Mass be offered for a special intention.",
            vec![
                Step::new(
                    "intention",
                    "Intention",
                    vec![
                        F::select("intention_type", "Type of Intention", &["Repose of the Soul", "Thanksgiving", "Special Intention", "Birthday", "Healing"])
                            .required(),
                        F::text("offered_for", "Offered For").required(),
                        F::date("preferred_date", "Preferred Mass Date").required(),
                        F::select("preferred_mass", "Preferred Mass", &["Saturday Vigil", "Sunday Morning", "Sunday Evening", "Weekday"]),
                    ],
                ),
                Step::new(
                    "requester",
                    "Requested By",
                    vec![
                        F::text("requested_by", "Your Name").required(),
                        F::email("email", "Email Address").required(),
                        F::phone("phone", "Phone Number"),
                        F::number("offering", "Offering Amount"),
                    ],
                ),
            ],
        ),
    };

    FormSchema {
        kind,
        title: kind.label(),
        description,
        steps,
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;
    use crate::forms::FieldKind;

    #[test]
    fn schema_lookup_returns_matching_kind() {
        for kind in FormKind::ALL {
            assert_eq!(schema(kind).kind, kind);
        }
    }

    #[test]
    fn field_names_are_unique_within_a_form() {
        for form in all() {
            let mut seen = HashSet::new();
            for field in form.fields() {
                assert!(seen.insert(field.name), "{} repeats {}", form.kind, field.name);
            }
        }
    }

    #[test]
    fn conditions_refer_to_earlier_fields() {
        for form in all() {
            for (i, step) in form.steps.iter().enumerate() {
                if let Some(cond) = &step.show_if {
                    let (owner, _) = form.field(cond.field).expect("condition field exists");
                    assert!(form.step_index(owner.id).unwrap() < i);
                }
            }
        }
    }

    #[test]
    fn donations_require_proof_of_payment() {
        let form = schema(FormKind::Donation);
        let (_, field) = form.field("proof_of_payment").unwrap();
        assert_eq!(field.kind, FieldKind::File);
        assert!(field.required);
    }

    #[test]
    fn no_form_uses_the_honeypot_name() {
        for form in all() {
            assert!(form.field(crate::submission::honeypot::FIELD).is_none());
        }
    }
}
