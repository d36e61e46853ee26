//! Action → HTTP status projection (§4.C10).
//!
//! Every route is tied to an [`ActionId`]; axum's own per-route method
//! registration already rejects disallowed verbs with 405, so this table
//! only has to resolve the remaining lookup order: exact (category, code),
//! then category-wide, then a per-method default, then 500.

use std::collections::HashMap;

use axum::http::{Method, StatusCode};
use overseer_error::OverseerError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActionId {
    ControllerInfo,
    Presets,
    PresetsGroup,
    Processes,
    ProcessInfo,
    ProcessConfigs,
    ProcessConfig,
    ProcessLog,
    ProcessOption,
    ProcessAction,
}

#[derive(Default)]
struct MethodRules {
    general: Option<StatusCode>,
    by_category: HashMap<&'static str, StatusCode>,
    by_code: HashMap<(&'static str, i64), StatusCode>,
}

impl MethodRules {
    fn all(mut self, status: StatusCode) -> Self {
        self.general = Some(status);
        self
    }

    fn category(mut self, category: &'static str, status: StatusCode) -> Self {
        self.by_category.insert(category, status);
        self
    }

    fn code(mut self, category: &'static str, code: i64, status: StatusCode) -> Self {
        self.by_code.insert((category, code), status);
        self
    }
}

pub struct StatusTable(HashMap<(ActionId, Method), MethodRules>);

impl StatusTable {
    pub fn new() -> Self {
        use overseer_error::{ControllerError as C, OptionError as O, ProcessError as P};

        fn cc(e: &C) -> (&'static str, i64) {
            (e.category(), e.code())
        }
        fn pc(e: &P) -> (&'static str, i64) {
            (e.category(), e.code())
        }
        fn oc(e: &O) -> (&'static str, i64) {
            (e.category(), e.code())
        }

        let mut table = HashMap::new();

        table.insert(
            (ActionId::ControllerInfo, Method::GET),
            MethodRules::default().all(StatusCode::INTERNAL_SERVER_ERROR),
        );

        table.insert(
            (ActionId::Presets, Method::GET),
            MethodRules::default().all(StatusCode::INTERNAL_SERVER_ERROR),
        );
        {
            let (cat, code) = cc(&C::ProcessIsRunning { detail: None });
            let (cat2, code2) = cc(&C::PresetsNotFound { detail: None });
            let (cat3, code3) = pc(&P::AlreadyRunning { detail: None });
            table.insert(
                (ActionId::Presets, Method::POST),
                MethodRules::default()
                    .code(cat, code, StatusCode::CONFLICT)
                    .code(cat2, code2, StatusCode::NOT_FOUND)
                    .code(cat3, code3, StatusCode::CONFLICT),
            );
        }

        {
            let (cat, code) = cc(&C::PresetsNotFound { detail: None });
            table.insert(
                (ActionId::PresetsGroup, Method::GET),
                MethodRules::default().code(cat, code, StatusCode::NOT_FOUND),
            );
        }

        table.insert(
            (ActionId::Processes, Method::GET),
            MethodRules::default().all(StatusCode::INTERNAL_SERVER_ERROR),
        );

        {
            let (cat, code) = cc(&C::ProcessNotFound { detail: None });
            table.insert(
                (ActionId::ProcessInfo, Method::GET),
                MethodRules::default().code(cat, code, StatusCode::NOT_FOUND),
            );
            table.insert(
                (ActionId::ProcessConfigs, Method::GET),
                MethodRules::default().code(cat, code, StatusCode::NOT_FOUND),
            );
            table.insert(
                (ActionId::ProcessLog, Method::GET),
                MethodRules::default().code(cat, code, StatusCode::NOT_FOUND),
            );
        }

        {
            let (cat, code) = cc(&C::ProcessNotFound { detail: None });
            let (cat2, code2) = pc(&P::NoSuchStorage { detail: None });
            table.insert(
                (ActionId::ProcessConfig, Method::GET),
                MethodRules::default()
                    .code(cat, code, StatusCode::NOT_FOUND)
                    .code(cat2, code2, StatusCode::NOT_FOUND),
            );
        }

        for method in [Method::GET, Method::PUT, Method::DELETE] {
            let mut rules = MethodRules::default()
                .code(
                    cc(&C::ProcessNotFound { detail: None }).0,
                    cc(&C::ProcessNotFound { detail: None }).1,
                    StatusCode::NOT_FOUND,
                )
                .code(
                    pc(&P::NoSuchStorage { detail: None }).0,
                    pc(&P::NoSuchStorage { detail: None }).1,
                    StatusCode::NOT_FOUND,
                )
                .code(
                    pc(&P::NoSuchOption { detail: None }).0,
                    pc(&P::NoSuchOption { detail: None }).1,
                    StatusCode::NOT_FOUND,
                )
                .code(
                    oc(&O::NotFoundInStorage { detail: None }).0,
                    oc(&O::NotFoundInStorage { detail: None }).1,
                    StatusCode::NOT_FOUND,
                );
            if method != Method::GET {
                rules = rules
                    .code(
                        pc(&P::CantEditConfigOfRunningProcess { detail: None }).0,
                        pc(&P::CantEditConfigOfRunningProcess { detail: None }).1,
                        StatusCode::CONFLICT,
                    )
                    .code(
                        pc(&P::SystemOptionEditForbidden { detail: None }).0,
                        pc(&P::SystemOptionEditForbidden { detail: None }).1,
                        StatusCode::FORBIDDEN,
                    );
            }
            if method == Method::PUT {
                rules = rules
                    .code(
                        oc(&O::MissingValue { detail: None }).0,
                        oc(&O::MissingValue { detail: None }).1,
                        StatusCode::CONFLICT,
                    )
                    .code(
                        oc(&O::AssigningSingleToListValue { detail: None }).0,
                        oc(&O::AssigningSingleToListValue { detail: None }).1,
                        StatusCode::CONFLICT,
                    )
                    .code(
                        oc(&O::AssigningListToSingleValue { detail: None }).0,
                        oc(&O::AssigningListToSingleValue { detail: None }).1,
                        StatusCode::CONFLICT,
                    )
                    .code(
                        oc(&O::TypeCheckFailed { detail: None }).0,
                        oc(&O::TypeCheckFailed { detail: None }).1,
                        StatusCode::CONFLICT,
                    )
                    .code(
                        oc(&O::ConstraintCheckFailed {
                            failed: Vec::new(),
                            detail: None,
                        })
                        .0,
                        oc(&O::ConstraintCheckFailed {
                            failed: Vec::new(),
                            detail: None,
                        })
                        .1,
                        StatusCode::CONFLICT,
                    );
            }
            table.insert((ActionId::ProcessOption, method), rules);
        }

        {
            let (cat, code) = cc(&C::ProcessNotFound { detail: None });
            let (cat2, code2) = pc(&P::AlreadyRunning { detail: None });
            let (cat3, code3) = pc(&P::ProcessNotRunning { detail: None });
            let (cat4, code4) = pc(&P::MissingRequiredOption { detail: None });
            let (cat5, code5) = pc(&P::ConfigFileWriteError { detail: None });
            table.insert(
                (ActionId::ProcessAction, Method::POST),
                MethodRules::default()
                    .code(cat, code, StatusCode::NOT_FOUND)
                    .code(cat2, code2, StatusCode::CONFLICT)
                    .code(cat3, code3, StatusCode::CONFLICT)
                    .code(cat4, code4, StatusCode::CONFLICT)
                    .code(cat5, code5, StatusCode::INTERNAL_SERVER_ERROR),
            );
        }

        StatusTable(table)
    }

    /// Resolve (action, method, error) to a status code per the lookup
    /// order: exact code, category-wide, per-method default, then 500.
    pub fn status_for(&self, action: ActionId, method: &Method, err: &OverseerError) -> StatusCode {
        let Some(rules) = self.0.get(&(action, method.clone())) else {
            return StatusCode::INTERNAL_SERVER_ERROR;
        };
        if let Some(status) = rules.by_code.get(&(err.category(), err.code())) {
            return *status;
        }
        if let Some(status) = rules.by_category.get(err.category()) {
            return *status;
        }
        rules.general.unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }
}

impl Default for StatusTable {
    fn default() -> Self {
        Self::new()
    }
}
