use core_types::Lang;
use serde::{Deserialize, Serialize};

/// Locale dictionary handed to the transform alongside the content.
///
/// Carries the strings the transform and the modal markup need: navigation
/// button labels, month names and the four modal dialogs.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Locale {
    pub lang: Lang,
    pub previous: String,
    pub reset: String,
    pub next: String,
    pub submit: String,
    pub months: [String; 12],
    pub response_requested_title: String,
    pub response_requested_body: String,
    pub response_required_title: String,
    pub response_required_body: String,
    pub response_error_title: String,
    pub response_error_body: String,
    pub submit_title: String,
    pub submit_body: String,
    pub continue_without_answering: String,
    pub answer_question: String,
    pub correct_answer: String,
    pub close: String,
    pub cancel: String,
}

impl Locale {
    pub fn for_lang(lang: Lang) -> Self {
        match lang {
            Lang::En => Self::english(),
            Lang::Es => Self::spanish(),
        }
    }

    pub fn english() -> Self {
        Self {
            lang: Lang::En,
            previous: "Back".into(),
            reset: "Reset answer".into(),
            next: "Next".into(),
            submit: "Submit Survey".into(),
            months: [
                "January",
                "February",
                "March",
                "April",
                "May",
                "June",
                "July",
                "August",
                "September",
                "October",
                "November",
                "December",
            ]
            .map(String::from),
            response_requested_title: "Response Requested".into(),
            response_requested_body: "There is 1 unanswered question on this page. Would you like to continue?".into(),
            response_required_title: "Response Required".into(),
            response_required_body: "There is 1 unanswered question on this page. Please answer this question.".into(),
            response_error_title: "Response Error".into(),
            response_error_body: "There is an error in your response. Please correct it before continuing.".into(),
            submit_title: "Submit Survey".into(),
            submit_body: "Are you sure you want to submit this survey? You will not be able to change your answers.".into(),
            continue_without_answering: "Continue Without Answering".into(),
            answer_question: "Answer the Question".into(),
            correct_answer: "Correct Answer".into(),
            close: "Close".into(),
            cancel: "Cancel".into(),
        }
    }

    pub fn spanish() -> Self {
        Self {
            lang: Lang::Es,
            previous: "Atrás".into(),
            reset: "Restablecer respuesta".into(),
            next: "Siguiente".into(),
            submit: "Enviar encuesta".into(),
            months: [
                "enero",
                "febrero",
                "marzo",
                "abril",
                "mayo",
                "junio",
                "julio",
                "agosto",
                "septiembre",
                "octubre",
                "noviembre",
                "diciembre",
            ]
            .map(String::from),
            response_requested_title: "Respuesta solicitada".into(),
            response_requested_body: "Hay 1 pregunta sin responder en esta página. ¿Desea continuar?".into(),
            response_required_title: "Respuesta requerida".into(),
            response_required_body: "Hay 1 pregunta sin responder en esta página. Por favor, responda esta pregunta.".into(),
            response_error_title: "Error de respuesta".into(),
            response_error_body: "Hay un error en su respuesta. Por favor, corríjalo antes de continuar.".into(),
            submit_title: "Enviar encuesta".into(),
            submit_body: "¿Está seguro de que desea enviar esta encuesta? No podrá cambiar sus respuestas.".into(),
            continue_without_answering: "Continuar sin responder".into(),
            answer_question: "Responder la pregunta".into(),
            correct_answer: "Corregir respuesta".into(),
            close: "Cerrar".into(),
            cancel: "Cancelar".into(),
        }
    }

    /// Month name for a 1-based month number.
    pub fn month_name(&self, month: u32) -> Option<&str> {
        let index = usize::try_from(month.checked_sub(1)?).ok()?;
        self.months.get(index).map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn month_names_are_one_based() {
        let en = Locale::english();
        assert_eq!(en.month_name(1), Some("January"));
        assert_eq!(en.month_name(12), Some("December"));
        assert_eq!(en.month_name(0), None);
        assert_eq!(en.month_name(13), None);
        assert_eq!(Locale::for_lang(Lang::Es).month_name(3), Some("marzo"));
    }
}
