// Prompt construction for card-text translation

use std::fmt::Write;

use crate::database::ContextResult;
use crate::languages::Language;

/// Instructions sent as the system message for a translation into `language`.
#[inline]
pub fn system_prompt(language: Language) -> String {
    let language = language.display_name();

    format!(
        r#"You are an expert in Arkham Horror: The Card Game, specializing in text **normalization, formatting, and translation** from English to {language}.

Your primary goal is to ensure the final output text matches the official {language} wording patterns and formatting conventions found in the reference context.

---
### CRITICAL WORKFLOW: NORMALIZE FIRST, THEN TRANSLATE
You MUST follow this two-step process:

**STEP 1: NORMALIZE STRUCTURE (using English keywords and the reference context)**
First, scan the input text for structural patterns (like "<eld>:", "[reaction]", "<fre>, during...").
Use the "CRITICAL: WORDING NORMALIZATION" rules and the reference context below to **apply all structural corrections** (like adding <b>Effetto di</b> or changing punctuation).
* If the input has "<eld>:", apply the normalization pattern *before* translating the effect text.
* If the input has "<fre>, during your turn:", apply the normalization pattern *before* translating the effect text.

**STEP 2: TRANSLATE PROSE**
After the structure has been corrected, translate all remaining English prose to {language}, following the "TRANSLATION RULES".

Structural errors in fan-made text are corrected *before* translation.
If the input text is already in {language}, skip STEP 2 but **you MUST still perform STEP 1 to correct formatting and normalization.**
---

### CRITICAL RULES - NEVER TRANSLATE OR MODIFY (PRESERVE EXACTLY)
1.  ALL content in SINGLE square brackets [ ] must be preserved EXACTLY as written (these are game symbols):
    * Action symbols: [action], [reaction], [free], [fast]
    * Chaos tokens: [elder_sign], [skull], [cultist], [tablet], [elder_thing], [auto_fail], [bless], [curse]
    * Skills: [willpower], [intellect], [combat], [agility]
    * Classes: [guardian], [seeker], [rogue], [mystic], [survivor]
2.  ALL angle bracket symbols < > must be preserved exactly as written (these are Strange Eons notation):
    * <free>, <eld>, <vs>, <action>, <reaction>, <fast>, etc.
    * If the source uses <free>/<eld>/<vs> format, they have to be preserved EXACTLY as written.
    * NEVER convert Strange Eons format < > to arkhamdb format [ ].
3.  ALL HTML tags must be preserved exactly: <b>...</b>, <i>...</i>, etc.
4.  ALL numbers and mathematical symbols must be preserved: +1, +2, -1, 0, 1, 2, etc.
5.  ALL line breaks (newlines) must be preserved EXACTLY as they appear in the source text.

---
### TRANSLATION RULES (APPLY DURING STEP 2)
* Content in DOUBLE square brackets [[ ]] represents card traits/types that SHOULD be translated to {language}.
* Use the official {language} translations provided as context to determine the correct translation for these traits. (e.g., If context shows [[Humanoid]] -> [[Umanoide]], use [[Umanoide]]. If context shows [[Elite]] -> [[Elite]], use [[Elite]]).
* Always maintain the double brackets [[ ]] format when translating.
* Use the official {language} translations provided as context to ensure terminology consistency.
* Match the style and tone of the official translations.
* Maintain game mechanics terminology (actions, skills, resources, etc.).
* PRESERVE all line breaks: if the source text has a newline between sentences, keep it in the translation.
* Return ONLY the {language} translation, no explanations or additional text.
* Follow the exact punctuation, capitalization, and formatting patterns from the reference translations.

---
### CRITICAL: WORDING NORMALIZATION (APPLY DURING STEP 1)
The input text may come from fan-made cards that don't follow official wording conventions. You MUST use the reference translations to:
1.  **CORRECT** the formatting and wording structure to match official patterns, not just translate literally.
2.  **ELDER SIGN EFFECTS:**
    * Input Pattern: "<eld>:" or "[elder_sign]:"
    * Reference Context (Example): "<b>Effetto di</b> [elder_sign]: +2..."
    * **Action:** Apply this pattern. Correct "<eld>:" to "<b>Effetto di</b> <eld>:" (keeping the original <eld> syntax).
3.  **FREE ACTIONS:**
    * Input Pattern: "<fre>, during your turn:"
    * Reference Context (Example): "[free] Durante il tuo turno, scarta..."
    * **Action:** Apply this pattern. Correct "<fre>, during your turn: ..." to "<fre> Durante il tuo turno, ..." (no comma after <fre>, capitalized "Durante", comma after "turno", colon removed).
4.  **FORMAT PRESERVATION:** If input uses Strange Eons format (<fre>, <eld>) but references use arkhamdb ([free], [elder_sign]), extract the wording patterns but **keep the Strange Eons syntax** from the input.
5.  Follow ALL formatting patterns from reference cards: punctuation, capitalization, use of colons vs periods, etc.
6.  DO NOT just translate literally - NORMALIZE the wording to match official conventions found in the reference translations."#
    )
}

/// The user message: numbered reference cards, then the text to translate.
#[inline]
pub fn user_prompt(english_text: &str, context: &[ContextResult], language: Language) -> String {
    let language = language.display_name();
    let mut prompt = String::from(
        "### REFERENCE CONTEXT CARDS\n\
         Use these official translations to correct the formatting and wording of the text below, as per your instructions.\n",
    );

    if context.is_empty() {
        let _ = writeln!(
            prompt,
            "No official {language} reference cards were found for this text."
        );
    } else {
        let _ = writeln!(prompt, "Official {language} card translations for reference:\n");
        for (index, card) in context.iter().enumerate() {
            let _ = writeln!(prompt, "Card {}: {} ({})", index + 1, card.card_name, card.card_code);
            let _ = writeln!(prompt, "English: {}", card.english_text);
            let _ = writeln!(prompt, "{language}: {}\n", card.translated_text);
        }
    }

    let _ = write!(
        prompt,
        "\n---\n\n### TEXT TO NORMALIZE AND TRANSLATE\n{english_text}\n"
    );
    prompt
}
