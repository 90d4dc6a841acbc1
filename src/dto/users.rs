use serde::Deserialize;
use utoipa::ToSchema;
use validator::Validate;

#[derive(Debug, Default, Deserialize, ToSchema, Validate)]
pub struct UpdateProfileRequest {
    #[validate(length(min = 1, max = 100))]
    pub name: Option<String>,
    #[validate(length(max = 100))]
    pub surname: Option<String>,
    #[validate(length(max = 32))]
    pub contact_number: Option<String>,
    #[validate(length(max = 500))]
    pub address: Option<String>,
    #[validate(length(max = 255))]
    pub card_details: Option<String>,
}
