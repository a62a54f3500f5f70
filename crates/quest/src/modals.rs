//! Dialog markup appended after the transformed questionnaire.

use markup::{Locale, escape_html};

pub const RESPONSE_REQUESTED_MODAL: &str = "responseRequestedModal";
pub const RESPONSE_REQUIRED_MODAL: &str = "responseRequiredModal";
pub const RESPONSE_ERROR_MODAL: &str = "responseErrorModal";

struct ModalButton<'a> {
    id: Option<&'a str>,
    class: &'a str,
    label: &'a str,
}

fn modal(id: &str, title: &str, body: &str, buttons: &[ModalButton<'_>]) -> String {
    let mut out = format!(
        "<div class=\"modal\" id=\"{id}\" tabindex=\"-1\" role=\"dialog\" aria-labelledby=\"{id}Title\" aria-hidden=\"true\">\
         <div class=\"modal-dialog\"><div class=\"modal-content\">\
         <div class=\"modal-header\"><h5 class=\"modal-title\" id=\"{id}Title\">{}</h5></div>\
         <div class=\"modal-body\" id=\"{id}Body\">{}</div>\
         <div class=\"modal-footer\">",
        escape_html(title),
        escape_html(body)
    );
    for b in buttons {
        out.push_str("<button type=\"button\"");
        if let Some(bid) = b.id {
            out.push_str(&format!(" id=\"{bid}\""));
        }
        out.push_str(&format!(" class=\"{}\">{}</button>", b.class, escape_html(b.label)));
    }
    out.push_str("</div></div></div></div>");
    out
}

pub fn response_requested_modal(locale: &Locale) -> String {
    modal(
        RESPONSE_REQUESTED_MODAL,
        &locale.response_requested_title,
        &locale.response_requested_body,
        &[
            ModalButton {
                id: Some("modalContinueButton"),
                class: "continue",
                label: &locale.continue_without_answering,
            },
            ModalButton {
                id: None,
                class: "close",
                label: &locale.answer_question,
            },
        ],
    )
}

pub fn response_required_modal(locale: &Locale) -> String {
    modal(
        RESPONSE_REQUIRED_MODAL,
        &locale.response_required_title,
        &locale.response_required_body,
        &[ModalButton {
            id: None,
            class: "close",
            label: &locale.answer_question,
        }],
    )
}

pub fn response_error_modal(locale: &Locale) -> String {
    modal(
        RESPONSE_ERROR_MODAL,
        &locale.response_error_title,
        &locale.response_error_body,
        &[ModalButton {
            id: None,
            class: "close",
            label: &locale.correct_answer,
        }],
    )
}

pub fn submit_modal(locale: &Locale) -> String {
    modal(
        crate::controller::SUBMIT_MODAL,
        &locale.submit_title,
        &locale.submit_body,
        &[
            ModalButton {
                id: Some(crate::router::SUBMIT_MODAL_BUTTON),
                class: "submit",
                label: &locale.submit,
            },
            ModalButton {
                id: None,
                class: "close",
                label: &locale.cancel,
            },
        ],
    )
}

/// All four dialogs, in injection order.
pub fn all(locale: &Locale) -> String {
    [
        response_requested_modal(locale),
        response_required_modal(locale),
        response_error_modal(locale),
        submit_modal(locale),
    ]
    .concat()
}
