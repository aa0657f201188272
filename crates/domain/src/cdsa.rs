//! Consortium data sharing agreements (CDSA) signed by PRIMED members.

use primed_core::{AppError, AppResult, NonEmptyString};
use serde::{Deserialize, Serialize};

use crate::anvil::{ManagedGroupId, UserId};
use crate::ids::uuid_identifier;

uuid_identifier!(
    /// Unique identifier for a signed agreement record.
    SignedAgreementId
);

/// Lifecycle status of a signed agreement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgreementStatus {
    /// Agreement is in force.
    Active,
    /// Signer withdrew from the agreement.
    Withdrawn,
    /// Agreement lapsed without renewal.
    Lapsed,
    /// Agreement was replaced by a newer version.
    Replaced,
}

impl AgreementStatus {
    /// Returns a stable storage value for this status.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Withdrawn => "withdrawn",
            Self::Lapsed => "lapsed",
            Self::Replaced => "replaced",
        }
    }
}

/// Agreement subtype together with the scope a primary agreement covers.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AgreementType {
    /// Signed on behalf of a member study site.
    Member {
        /// Study site covered by the agreement.
        study_site: String,
    },
    /// Signed by a data affiliate contributing one study.
    DataAffiliate {
        /// Study contributed under the agreement.
        study: String,
    },
    /// Signed by a non-data affiliate.
    NonDataAffiliate {
        /// Affiliation named on the agreement.
        affiliation: String,
    },
}

impl AgreementType {
    /// Returns a stable label for the subtype.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Member { .. } => "member",
            Self::DataAffiliate { .. } => "data_affiliate",
            Self::NonDataAffiliate { .. } => "non_data_affiliate",
        }
    }

    /// Returns whether a primary agreement of type `primary` covers this one.
    #[must_use]
    pub fn is_covered_by(&self, primary: &AgreementType) -> bool {
        match (self, primary) {
            (
                Self::Member { study_site },
                Self::Member {
                    study_site: primary_site,
                },
            ) => study_site == primary_site,
            (
                Self::DataAffiliate { study },
                Self::DataAffiliate {
                    study: primary_study,
                },
            ) => study == primary_study,
            _ => false,
        }
    }
}

/// Input payload for creating a signed agreement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedAgreementInput {
    /// Record identifier.
    pub id: SignedAgreementId,
    /// Coordinating-center identifier printed on the agreement.
    pub cc_id: u32,
    /// Person who signed the agreement.
    pub representative: UserId,
    /// Agreement version label, e.g. `v1.0`.
    pub version: String,
    /// Whether this is a primary (as opposed to component) agreement.
    pub is_primary: bool,
    /// Lifecycle status.
    pub status: AgreementStatus,
    /// Subtype and coverage scope.
    pub agreement_type: AgreementType,
    /// People named as accessors.
    pub accessors: Vec<UserId>,
    /// Group granting accessors access to governed workspaces.
    pub access_group: ManagedGroupId,
}

/// A signed, versioned data sharing agreement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignedAgreement {
    id: SignedAgreementId,
    cc_id: u32,
    representative: UserId,
    version: NonEmptyString,
    is_primary: bool,
    status: AgreementStatus,
    agreement_type: AgreementType,
    accessors: Vec<UserId>,
    access_group: ManagedGroupId,
}

impl SignedAgreement {
    /// Creates a validated signed agreement.
    pub fn new(input: SignedAgreementInput) -> AppResult<Self> {
        if input.cc_id == 0 {
            return Err(AppError::Validation(
                "signed agreement cc_id must be greater than zero".to_owned(),
            ));
        }

        let mut accessors = input.accessors;
        accessors.sort();
        accessors.dedup();

        Ok(Self {
            id: input.id,
            cc_id: input.cc_id,
            representative: input.representative,
            version: NonEmptyString::new(input.version)?,
            is_primary: input.is_primary,
            status: input.status,
            agreement_type: input.agreement_type,
            accessors,
            access_group: input.access_group,
        })
    }

    /// Returns the record identifier.
    #[must_use]
    pub fn id(&self) -> SignedAgreementId {
        self.id
    }

    /// Returns the coordinating-center identifier.
    #[must_use]
    pub fn cc_id(&self) -> u32 {
        self.cc_id
    }

    /// Returns the signing representative.
    #[must_use]
    pub fn representative(&self) -> UserId {
        self.representative
    }

    /// Returns the agreement version label.
    #[must_use]
    pub fn version(&self) -> &str {
        self.version.as_str()
    }

    /// Returns whether this is a primary agreement.
    #[must_use]
    pub fn is_primary(&self) -> bool {
        self.is_primary
    }

    /// Returns the lifecycle status.
    #[must_use]
    pub fn status(&self) -> AgreementStatus {
        self.status
    }

    /// Returns whether the agreement is currently in force.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.status == AgreementStatus::Active
    }

    /// Returns the subtype and coverage scope.
    #[must_use]
    pub fn agreement_type(&self) -> &AgreementType {
        &self.agreement_type
    }

    /// Returns the declared accessors.
    #[must_use]
    pub fn accessors(&self) -> &[UserId] {
        self.accessors.as_slice()
    }

    /// Returns the access group.
    #[must_use]
    pub fn access_group(&self) -> ManagedGroupId {
        self.access_group
    }
}

/// A data affiliate agreement with its uploaders.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataAffiliateAgreement {
    signed_agreement: SignedAgreement,
    uploaders: Vec<UserId>,
    upload_group: ManagedGroupId,
}

impl DataAffiliateAgreement {
    /// Wraps a data affiliate signed agreement with its upload terms.
    pub fn new(
        signed_agreement: SignedAgreement,
        uploaders: Vec<UserId>,
        upload_group: ManagedGroupId,
    ) -> AppResult<Self> {
        if !matches!(
            signed_agreement.agreement_type(),
            AgreementType::DataAffiliate { .. }
        ) {
            return Err(AppError::Validation(format!(
                "signed agreement {} is a {} agreement, not a data affiliate agreement",
                signed_agreement.cc_id(),
                signed_agreement.agreement_type().as_str()
            )));
        }

        let mut uploaders = uploaders;
        uploaders.sort();
        uploaders.dedup();

        Ok(Self {
            signed_agreement,
            uploaders,
            upload_group,
        })
    }

    /// Returns the underlying signed agreement.
    #[must_use]
    pub fn signed_agreement(&self) -> &SignedAgreement {
        &self.signed_agreement
    }

    /// Returns the declared uploaders.
    #[must_use]
    pub fn uploaders(&self) -> &[UserId] {
        self.uploaders.as_slice()
    }

    /// Returns the upload group.
    #[must_use]
    pub fn upload_group(&self) -> ManagedGroupId {
        self.upload_group
    }
}

#[cfg(test)]
mod tests {
    use super::{
        AgreementStatus, AgreementType, DataAffiliateAgreement, SignedAgreement,
        SignedAgreementId, SignedAgreementInput,
    };
    use crate::anvil::{ManagedGroupId, UserId};

    fn input(agreement_type: AgreementType) -> SignedAgreementInput {
        SignedAgreementInput {
            id: SignedAgreementId::new(),
            cc_id: 1001,
            representative: UserId::new(),
            version: "v1.0".to_owned(),
            is_primary: true,
            status: AgreementStatus::Active,
            agreement_type,
            accessors: Vec::new(),
            access_group: ManagedGroupId::new(),
        }
    }

    #[test]
    fn signed_agreement_rejects_zero_cc_id() {
        let mut input = input(AgreementType::NonDataAffiliate {
            affiliation: "Broad".to_owned(),
        });
        input.cc_id = 0;
        assert!(SignedAgreement::new(input).is_err());
    }

    #[test]
    fn signed_agreement_deduplicates_accessors() {
        let accessor = UserId::new();
        let mut input = input(AgreementType::Member {
            study_site: "CARDINAL".to_owned(),
        });
        input.accessors = vec![accessor, accessor];
        let agreement = SignedAgreement::new(input);
        assert!(agreement.is_ok_and(|agreement| agreement.accessors() == [accessor]));
    }

    #[test]
    fn data_affiliate_agreement_requires_data_affiliate_type() {
        let member = SignedAgreement::new(input(AgreementType::Member {
            study_site: "CARDINAL".to_owned(),
        }));
        assert!(member.is_ok());
        if let Ok(member) = member {
            let wrapped = DataAffiliateAgreement::new(member, Vec::new(), ManagedGroupId::new());
            assert!(wrapped.is_err());
        }
    }

    #[test]
    fn component_coverage_requires_matching_scope() {
        let component = AgreementType::DataAffiliate {
            study: "MESA".to_owned(),
        };
        assert!(component.is_covered_by(&AgreementType::DataAffiliate {
            study: "MESA".to_owned()
        }));
        assert!(!component.is_covered_by(&AgreementType::DataAffiliate {
            study: "JHS".to_owned()
        }));
        assert!(!component.is_covered_by(&AgreementType::Member {
            study_site: "MESA".to_owned()
        }));
    }
}
