//! Typed records for the nine source extracts.
//!
//! Fields other than single-column primary keys are optional so that nulls
//! survive loading and can be measured by the completeness check.

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::row::{IntoRow, Row};
use crate::schema::{
    TableSchema, CHANNEL_CODE, PLAN, PLAN_PAYMENT_FREQUENCY, STATUS_CODE, USER,
    USER_PAYMENT_DETAIL, USER_PLAN, USER_PLAY_SESSION, USER_REGISTRATION,
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub user_id: i64,
    pub ip_address: Option<String>,
    pub social_media_handle: Option<String>,
    pub email: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserRegistration {
    pub user_registration_id: i64,
    pub user_id: Option<i64>,
    pub username: Option<String>,
    pub email: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserPlan {
    pub user_registration_id: Option<i64>,
    pub payment_detail_id: Option<i64>,
    pub plan_id: Option<i64>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentDetail {
    pub payment_detail_id: i64,
    pub payment_method_code: Option<String>,
    pub payment_method_value: Option<String>,
    pub payment_method_expiry: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Plan {
    pub plan_id: i64,
    pub payment_frequency_code: Option<String>,
    pub cost_amount: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentFrequency {
    pub payment_frequency_code: String,
    pub english_description: Option<String>,
    pub french_description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaySession {
    pub play_session_id: i64,
    pub user_id: Option<i64>,
    pub start_datetime: Option<NaiveDateTime>,
    pub end_datetime: Option<NaiveDateTime>,
    pub channel_code: Option<String>,
    pub status_code: Option<String>,
    pub total_score: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChannelCode {
    pub play_session_channel_code: String,
    pub english_description: Option<String>,
    pub french_description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusCode {
    pub play_session_status_code: String,
    pub english_description: Option<String>,
    pub french_description: Option<String>,
}

impl IntoRow for User {
    fn schema() -> &'static TableSchema {
        &USER
    }

    fn to_row(&self) -> Row {
        crate::row![
            self.user_id,
            self.ip_address.as_ref(),
            self.social_media_handle.as_ref(),
            self.email.as_ref(),
        ]
    }
}

impl IntoRow for UserRegistration {
    fn schema() -> &'static TableSchema {
        &USER_REGISTRATION
    }

    fn to_row(&self) -> Row {
        crate::row![
            self.user_registration_id,
            self.user_id,
            self.username.as_ref(),
            self.email.as_ref(),
            self.first_name.as_ref(),
            self.last_name.as_ref(),
        ]
    }
}

impl IntoRow for UserPlan {
    fn schema() -> &'static TableSchema {
        &USER_PLAN
    }

    fn to_row(&self) -> Row {
        crate::row![
            self.user_registration_id,
            self.payment_detail_id,
            self.plan_id,
            self.start_date,
            self.end_date,
        ]
    }
}

impl IntoRow for PaymentDetail {
    fn schema() -> &'static TableSchema {
        &USER_PAYMENT_DETAIL
    }

    fn to_row(&self) -> Row {
        crate::row![
            self.payment_detail_id,
            self.payment_method_code.as_ref(),
            self.payment_method_value.as_ref(),
            self.payment_method_expiry.as_ref(),
        ]
    }
}

impl IntoRow for Plan {
    fn schema() -> &'static TableSchema {
        &PLAN
    }

    fn to_row(&self) -> Row {
        crate::row![
            self.plan_id,
            self.payment_frequency_code.as_ref(),
            self.cost_amount,
        ]
    }
}

impl IntoRow for PaymentFrequency {
    fn schema() -> &'static TableSchema {
        &PLAN_PAYMENT_FREQUENCY
    }

    fn to_row(&self) -> Row {
        crate::row![
            &self.payment_frequency_code,
            self.english_description.as_ref(),
            self.french_description.as_ref(),
        ]
    }
}

impl IntoRow for PlaySession {
    fn schema() -> &'static TableSchema {
        &USER_PLAY_SESSION
    }

    fn to_row(&self) -> Row {
        crate::row![
            self.play_session_id,
            self.user_id,
            self.start_datetime,
            self.end_datetime,
            self.channel_code.as_ref(),
            self.status_code.as_ref(),
            self.total_score,
        ]
    }
}

impl IntoRow for ChannelCode {
    fn schema() -> &'static TableSchema {
        &CHANNEL_CODE
    }

    fn to_row(&self) -> Row {
        crate::row![
            &self.play_session_channel_code,
            self.english_description.as_ref(),
            self.french_description.as_ref(),
        ]
    }
}

impl IntoRow for StatusCode {
    fn schema() -> &'static TableSchema {
        &STATUS_CODE
    }

    fn to_row(&self) -> Row {
        crate::row![
            &self.play_session_status_code,
            self.english_description.as_ref(),
            self.french_description.as_ref(),
        ]
    }
}
