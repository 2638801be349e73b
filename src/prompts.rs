//! Phase prompts for the analysis pipeline, localised per [`Language`].
//!
//! Every prompt lives here so a wording change touches exactly one file and
//! unit tests can inspect prompts without a network round-trip.
//!
//! Templates use `{features}`, `{hypothesis}`, `{coordinates}` and `{label}`
//! placeholders which [`compose_prompts`] fills in.

use crate::request::{Language, TrustedLocation};

/// The three prompts of one pipeline run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComposedPrompts {
    pub feature_extraction: String,
    pub hypothesis: String,
    pub synthesis: String,
}

/// Static prompt templates for one language.
struct PromptSet {
    feature_extraction: &'static str,
    hypothesis: &'static str,
    synthesis: &'static str,
    hypothesis_context: &'static str,
    trusted_preamble: &'static str,
    trusted_label: &'static str,
    no_features: &'static str,
}

/// Build all phase prompts for a run.
///
/// * `features` — feature summary from the extraction phase, if it ran.
/// * `hypothesis` — candidate location from the hypothesis phase, offered to
///   the synthesis prompt as a lead to verify.
/// * `trusted` — when present, the synthesis prompt opens with a preamble
///   telling the model to treat these coordinates as ground truth, and
///   `hypothesis` is ignored.
pub fn compose_prompts(
    language: Language,
    features: Option<&str>,
    hypothesis: Option<&str>,
    trusted: Option<&TrustedLocation>,
) -> ComposedPrompts {
    let set = prompt_set(language);

    let features = features
        .map(str::trim)
        .filter(|f| !f.is_empty())
        .unwrap_or(set.no_features);

    // A trusted location replaces the hypothesis context: the preamble already
    // names the place, and the context would invite the model to doubt it.
    let mut synthesis = String::new();
    match trusted {
        Some(loc) => {
            synthesis.push_str(&trusted_preamble(set, loc));
            synthesis.push_str("\n\n");
            synthesis.push_str(set.synthesis);
        }
        None => {
            synthesis.push_str(set.synthesis);
            if let Some(h) = hypothesis.map(str::trim).filter(|h| !h.is_empty()) {
                synthesis.push_str("\n\n");
                synthesis.push_str(&set.hypothesis_context.replace("{hypothesis}", h));
            }
        }
    }

    ComposedPrompts {
        feature_extraction: set.feature_extraction.to_string(),
        hypothesis: set.hypothesis.replace("{features}", features),
        synthesis,
    }
}

/// Same as [`compose_prompts`] but takes a raw locale tag.
///
/// Unsupported locales fall back to English.
pub fn compose_prompts_for_locale(
    locale: &str,
    features: Option<&str>,
    hypothesis: Option<&str>,
    trusted: Option<&TrustedLocation>,
) -> ComposedPrompts {
    compose_prompts(Language::from_locale(locale), features, hypothesis, trusted)
}

fn trusted_preamble(set: &PromptSet, loc: &TrustedLocation) -> String {
    let label = loc
        .label
        .as_deref()
        .map(|l| set.trusted_label.replace("{label}", l))
        .unwrap_or_default();
    set.trusted_preamble
        .replace("{coordinates}", &loc.coordinates())
        .replace("{label}", &label)
}

fn prompt_set(language: Language) -> &'static PromptSet {
    match language {
        Language::En => &EN,
        Language::Es => &ES,
        Language::Zh => &ZH,
        Language::Hi => &HI,
        Language::Fr => &FR,
        Language::Ru => &RU,
        Language::Pt => &PT,
    }
}

// ── English ──────────────────────────────────────────────────────────────

static EN: PromptSet = PromptSet {
    feature_extraction: r#"You are the visual-evidence stage of 'GeoCognition AI', a geospatial intelligence system.
List every feature in this image that could help pin down where it was taken:
- Architecture, building materials, roof styles
- Signs, text, languages, scripts, licence plates, brands
- Vegetation, terrain, climate, sun position
- Road markings, driving side, street furniture, utility poles
- Landmarks or distinctive natural formations
Be factual and concise. Do not guess the location yet. Respond in English."#,
    hypothesis: r#"You are the investigation stage of 'GeoCognition AI'. Using web search, find the single most likely location matching these visual features:

{features}

Answer with ONE specific, recognisable place name (e.g. "Bárcena Mayor, Cantabria, Spain") and nothing else. Respond in English."#,
    synthesis: r#"Act as 'GeoCognition AI', a geospatial intelligence system. Your mission is to produce a final report by analysing an image.
**Your task:**
1. **Final conclusion:** Determine the most likely location. Give the most specific, recognisable place name possible (e.g. "Bárcena Mayor, Cantabria") instead of generic descriptions.
2. **Forensic analysis (AI/alteration):** Inspect the image for artefacts of AI generation or digital manipulation and assess its authenticity. If the image is not altered, alterationConfidence must be 0.
3. **Environment analysis (indoor/outdoor):** Decide whether the scene is interior or exterior and explain what that implies for geolocation.
4. **Confidence score (0-100):** A famous landmark in high resolution: 90-95. A specific but less known place (a particular street corner): 75-85. A generic landscape (forest, beach) with few unique features: 40-60. If you cannot determine a location, stay below 20.
Produce the report in the requested JSON format. If the evidence is inconclusive, say so clearly. Respond in English."#,
    hypothesis_context: r#"A preliminary investigation suggested this location: "{hypothesis}". Treat it as a lead to verify against the visual evidence, not as a certainty."#,
    trusted_preamble: r#"IMPORTANT: This photo was taken at the verified coordinates {coordinates}{label}. Treat this position as ground truth. Do not infer the location independently; describe and name the place at these coordinates and use the image to confirm details."#,
    trusted_label: r#" ("{label}")"#,
    no_features: "(no features were extracted)",
};

// ── Spanish ──────────────────────────────────────────────────────────────

static ES: PromptSet = PromptSet {
    feature_extraction: r#"Eres la etapa de evidencia visual de 'GeoCognition AI', un sistema de inteligencia geoespacial.
Enumera cada rasgo de esta imagen que ayude a determinar dónde fue tomada:
- Arquitectura, materiales de construcción, tipos de tejado
- Carteles, textos, idiomas, alfabetos, matrículas, marcas
- Vegetación, relieve, clima, posición del sol
- Marcas viales, sentido de circulación, mobiliario urbano, postes
- Monumentos o formaciones naturales distintivas
Sé factual y conciso. Todavía no adivines la ubicación. Responde en español."#,
    hypothesis: r#"Eres la etapa de investigación de 'GeoCognition AI'. Usando la búsqueda web, encuentra la ubicación más probable que coincida con estos rasgos visuales:

{features}

Responde con UN solo nombre de lugar específico y reconocible (ej: "Bárcena Mayor, Cantabria, España") y nada más. Responde en español."#,
    synthesis: r#"Actúa como 'GeoCognition AI', un sistema de inteligencia geoespacial. Tu misión es generar un informe final analizando una imagen.
**Tu tarea:**
1. **Conclusión final:** Determina la ubicación más probable. Proporciona el nombre de lugar más específico y reconocible posible (ej: "Bárcena Mayor, Cantabria") en lugar de descripciones genéricas.
2. **Análisis forense (IA/alteración):** Inspecciona la imagen en busca de artefactos de generación por IA o manipulación digital y evalúa su autenticidad. Si la imagen no está alterada, alterationConfidence debe ser 0.
3. **Análisis del entorno (interior/exterior):** Determina si la escena es interior o exterior y explica sus implicaciones para la geolocalización.
4. **Nivel de confianza (0-100):** Un monumento famoso en alta resolución: 90-95. Un lugar específico pero poco conocido (una esquina concreta): 75-85. Un paisaje genérico (bosque, playa) con pocos rasgos únicos: 40-60. Si no puedes determinar una ubicación, menos de 20.
Genera el informe en el formato JSON solicitado. Si los datos no son concluyentes, indícalo claramente. Responde en español."#,
    hypothesis_context: r#"Una investigación preliminar sugirió esta ubicación: "{hypothesis}". Trátala como una pista a verificar con la evidencia visual, no como una certeza."#,
    trusted_preamble: r#"IMPORTANTE: Esta foto fue tomada en las coordenadas verificadas {coordinates}{label}. Trata esta posición como verdad absoluta. No infieras la ubicación por tu cuenta; describe y nombra el lugar en estas coordenadas y usa la imagen para confirmar detalles."#,
    trusted_label: r#" ("{label}")"#,
    no_features: "(no se extrajeron rasgos)",
};

// ── Chinese ──────────────────────────────────────────────────────────────

static ZH: PromptSet = PromptSet {
    feature_extraction: r#"您是“地理认知AI”地理空间情报系统的视觉证据阶段。
列出图像中所有有助于确定拍摄地点的特征：
- 建筑风格、建筑材料、屋顶样式
- 标志、文字、语言、书写系统、车牌、品牌
- 植被、地形、气候、太阳位置
- 道路标线、行驶方向、街道设施、电线杆
- 地标或独特的自然地貌
请如实、简洁地描述。暂时不要猜测位置。请用中文回答。"#,
    hypothesis: r#"您是“地理认知AI”的调查阶段。请使用网络搜索，找出与以下视觉特征最匹配的地点：

{features}

只回答一个具体、可识别的地名（例如“西班牙坎塔布里亚的巴尔塞纳马约尔”），不要添加其他内容。请用中文回答。"#,
    synthesis: r#"扮演“地理认知AI”，一个地理空间情报系统。您的任务是通过分析图像生成最终报告。
**您的任务：**
1. **最终结论：** 确定最可能的位置。提供最具体、最可识别的地名（例如“坎塔布里亚的巴尔塞纳马约尔”），而不是笼统的描述。
2. **法证分析（AI/篡改）：** 检查图像中是否存在AI生成或数字篡改的痕迹，评估其真实性。如果图像未被篡改，alterationConfidence 必须为 0。
3. **环境分析（室内/室外）：** 判断场景是室内还是室外，并解释其对地理定位的影响。
4. **置信度分数（0-100）：** 高分辨率的著名地标：90-95。特定但不太知名的地点（如某个街角）：75-85。几乎没有独特特征的普通景观（森林、海滩）：40-60。如果无法确定位置，应低于20。
以请求的JSON格式生成报告。如果证据不确定，请明确说明。请用中文回答。"#,
    hypothesis_context: r#"初步调查提示的位置为：“{hypothesis}”。请将其视为需要用视觉证据核实的线索，而非定论。"#,
    trusted_preamble: r#"重要：这张照片拍摄于经过验证的坐标 {coordinates}{label}。请将此位置视为事实依据。不要自行推断位置；请描述并命名该坐标处的地点，并利用图像确认细节。"#,
    trusted_label: r#"（“{label}”）"#,
    no_features: "（未提取到特征）",
};

// ── Hindi ────────────────────────────────────────────────────────────────

static HI: PromptSet = PromptSet {
    feature_extraction: r#"आप 'जियोकॉग्निशन एआई' भू-स्थानिक खुफिया प्रणाली के दृश्य-साक्ष्य चरण हैं।
इस छवि की हर वह विशेषता सूचीबद्ध करें जो यह तय करने में मदद करे कि इसे कहाँ लिया गया था:
- वास्तुकला, निर्माण सामग्री, छत की शैली
- संकेत, पाठ, भाषाएँ, लिपियाँ, नंबर प्लेट, ब्रांड
- वनस्पति, भू-भाग, जलवायु, सूर्य की स्थिति
- सड़क चिह्न, वाहन चलाने की दिशा, सड़क उपकरण, खंभे
- स्थलचिह्न या विशिष्ट प्राकृतिक संरचनाएँ
तथ्यात्मक और संक्षिप्त रहें। अभी स्थान का अनुमान न लगाएँ। कृपया हिंदी में उत्तर दें।"#,
    hypothesis: r#"आप 'जियोकॉग्निशन एआई' के जाँच चरण हैं। वेब खोज का उपयोग करके इन दृश्य विशेषताओं से मेल खाने वाला सबसे संभावित स्थान खोजें:

{features}

केवल एक विशिष्ट, पहचानने योग्य स्थान का नाम लिखें (जैसे, "बार्सेना मेयर, कैंटैब्रिया, स्पेन") और कुछ नहीं। कृपया हिंदी में उत्तर दें।"#,
    synthesis: r#"'जियोकॉग्निशन एआई' के रूप में कार्य करें, जो एक भू-स्थानिक खुफिया प्रणाली है। आपका मिशन एक छवि का विश्लेषण करके अंतिम रिपोर्ट तैयार करना है।
**आपका कार्य:**
1. **अंतिम निष्कर्ष:** सबसे संभावित स्थान निर्धारित करें। सामान्य विवरण के बजाय सबसे विशिष्ट, पहचानने योग्य स्थान का नाम दें (जैसे, "बार्सेना मेयर, कैंटैब्रिया")।
2. **फोरेंसिक विश्लेषण (एआई/परिवर्तन):** एआई निर्माण या डिजिटल हेरफेर के संकेतों के लिए छवि की जाँच करें और इसकी प्रामाणिकता का आकलन करें। यदि छवि परिवर्तित नहीं है, तो alterationConfidence 0 होना चाहिए।
3. **पर्यावरण विश्लेषण (इनडोर/आउटडोर):** तय करें कि दृश्य इनडोर है या आउटडोर और जियोलोकेशन के लिए इसके निहितार्थ समझाएँ।
4. **विश्वास स्कोर (0-100):** उच्च रिज़ॉल्यूशन में प्रसिद्ध स्थलचिह्न: 90-95। विशिष्ट लेकिन कम ज्ञात स्थान (कोई विशेष सड़क का कोना): 75-85। कम अनूठी विशेषताओं वाला सामान्य परिदृश्य (जंगल, समुद्र तट): 40-60। यदि स्थान निर्धारित नहीं कर सकते, तो 20 से कम।
अनुरोधित JSON प्रारूप में रिपोर्ट तैयार करें। यदि साक्ष्य अनिर्णायक है, तो स्पष्ट रूप से बताएँ। कृपया हिंदी में उत्तर दें।"#,
    hypothesis_context: r#"प्रारंभिक जाँच ने यह स्थान सुझाया: "{hypothesis}"। इसे निश्चितता नहीं, बल्कि दृश्य साक्ष्य से सत्यापित किए जाने वाले संकेत के रूप में लें।"#,
    trusted_preamble: r#"महत्वपूर्ण: यह फ़ोटो सत्यापित निर्देशांक {coordinates}{label} पर ली गई थी। इस स्थिति को निर्विवाद सत्य मानें। स्थान का स्वतंत्र रूप से अनुमान न लगाएँ; इन निर्देशांकों पर स्थित स्थान का वर्णन और नाम दें तथा विवरणों की पुष्टि के लिए छवि का उपयोग करें।"#,
    trusted_label: r#" ("{label}")"#,
    no_features: "(कोई विशेषता नहीं निकाली गई)",
};

// ── French ───────────────────────────────────────────────────────────────

static FR: PromptSet = PromptSet {
    feature_extraction: r#"Vous êtes l'étape d'analyse visuelle de 'GeoCognition AI', un système d'intelligence géospatiale.
Listez chaque élément de cette image qui peut aider à déterminer où elle a été prise :
- Architecture, matériaux de construction, types de toiture
- Panneaux, textes, langues, alphabets, plaques d'immatriculation, marques
- Végétation, relief, climat, position du soleil
- Marquage routier, sens de circulation, mobilier urbain, poteaux
- Monuments ou formations naturelles remarquables
Soyez factuel et concis. Ne devinez pas encore l'emplacement. Répondez en français."#,
    hypothesis: r#"Vous êtes l'étape d'enquête de 'GeoCognition AI'. À l'aide de la recherche web, trouvez l'emplacement le plus probable correspondant à ces éléments visuels :

{features}

Répondez par UN seul nom de lieu précis et reconnaissable (par ex. "Bárcena Mayor, Cantabrie, Espagne") et rien d'autre. Répondez en français."#,
    synthesis: r#"Agissez en tant que 'GeoCognition AI', un système d'intelligence géospatiale. Votre mission est de produire un rapport final en analysant une image.
**Votre tâche :**
1. **Conclusion finale :** Déterminez l'emplacement le plus probable. Donnez le nom de lieu le plus précis et reconnaissable possible (par ex. "Bárcena Mayor, Cantabrie") plutôt qu'une description générique.
2. **Analyse forensique (IA/altération) :** Inspectez l'image à la recherche d'artefacts de génération par IA ou de manipulation numérique et évaluez son authenticité. Si l'image n'est pas altérée, alterationConfidence doit valoir 0.
3. **Analyse de l'environnement (intérieur/extérieur) :** Déterminez si la scène est intérieure ou extérieure et expliquez les conséquences pour la géolocalisation.
4. **Score de confiance (0-100) :** Un monument célèbre en haute résolution : 90-95. Un lieu précis mais peu connu (un coin de rue particulier) : 75-85. Un paysage générique (forêt, plage) avec peu d'éléments uniques : 40-60. Si vous ne pouvez pas déterminer d'emplacement, moins de 20.
Produisez le rapport au format JSON demandé. Si les éléments ne sont pas concluants, indiquez-le clairement. Répondez en français."#,
    hypothesis_context: r#"Une enquête préliminaire a suggéré cet emplacement : "{hypothesis}". Considérez-le comme une piste à vérifier avec les éléments visuels, pas comme une certitude."#,
    trusted_preamble: r#"IMPORTANT : Cette photo a été prise aux coordonnées vérifiées {coordinates}{label}. Considérez cette position comme une vérité établie. N'inférez pas l'emplacement par vous-même ; décrivez et nommez le lieu situé à ces coordonnées et servez-vous de l'image pour confirmer les détails."#,
    trusted_label: r#" (« {label} »)"#,
    no_features: "(aucun élément extrait)",
};

// ── Russian ──────────────────────────────────────────────────────────────

static RU: PromptSet = PromptSet {
    feature_extraction: r#"Вы — этап визуального анализа 'GeoCognition AI', геопространственной разведывательной системы.
Перечислите все признаки на изображении, которые помогут определить место съёмки:
- Архитектура, строительные материалы, типы крыш
- Вывески, надписи, языки, алфавиты, номерные знаки, бренды
- Растительность, рельеф, климат, положение солнца
- Дорожная разметка, сторона движения, уличная инфраструктура, столбы
- Достопримечательности или характерные природные объекты
Будьте точны и кратки. Пока не угадывайте местоположение. Отвечайте на русском языке."#,
    hypothesis: r#"Вы — этап расследования 'GeoCognition AI'. С помощью веб-поиска найдите наиболее вероятное место, соответствующее этим визуальным признакам:

{features}

Ответьте ОДНИМ конкретным и узнаваемым названием места (например, "Барсена-Майор, Кантабрия, Испания") и ничем больше. Отвечайте на русском языке."#,
    synthesis: r#"Действуйте как 'GeoCognition AI', геопространственная разведывательная система. Ваша миссия — составить итоговый отчёт на основе анализа изображения.
**Ваша задача:**
1. **Окончательный вывод:** Определите наиболее вероятное местоположение. Укажите максимально конкретное и узнаваемое название места (например, "Барсена-Майор, Кантабрия"), а не общее описание.
2. **Криминалистический анализ (ИИ/изменения):** Проверьте изображение на артефакты генерации ИИ или цифровой обработки и оцените его подлинность. Если изображение не изменено, alterationConfidence должно быть 0.
3. **Анализ окружения (помещение/улица):** Определите, снята ли сцена в помещении или на улице, и объясните, что это значит для геолокации.
4. **Оценка достоверности (0-100):** Известная достопримечательность в высоком разрешении: 90-95. Конкретное, но малоизвестное место (определённый угол улицы): 75-85. Обычный пейзаж (лес, пляж) с малым числом уникальных черт: 40-60. Если местоположение определить нельзя — ниже 20.
Составьте отчёт в запрошенном формате JSON. Если данные неубедительны, чётко укажите это. Отвечайте на русском языке."#,
    hypothesis_context: r#"Предварительное расследование указало на это место: "{hypothesis}". Рассматривайте его как версию, которую нужно проверить по визуальным признакам, а не как факт."#,
    trusted_preamble: r#"ВАЖНО: Эта фотография сделана в проверенных координатах {coordinates}{label}. Считайте эту позицию достоверной. Не определяйте местоположение самостоятельно; опишите и назовите место в этих координатах, а изображение используйте для подтверждения деталей."#,
    trusted_label: r#" («{label}»)"#,
    no_features: "(признаки не извлечены)",
};

// ── Portuguese ───────────────────────────────────────────────────────────

static PT: PromptSet = PromptSet {
    feature_extraction: r#"Você é a etapa de evidência visual do 'GeoCognition AI', um sistema de inteligência geoespacial.
Liste cada característica desta imagem que possa ajudar a determinar onde ela foi tirada:
- Arquitetura, materiais de construção, tipos de telhado
- Placas, textos, idiomas, alfabetos, matrículas, marcas
- Vegetação, relevo, clima, posição do sol
- Sinalização viária, lado de circulação, mobiliário urbano, postes
- Marcos ou formações naturais distintivas
Seja factual e conciso. Ainda não tente adivinhar a localização. Responda em português."#,
    hypothesis: r#"Você é a etapa de investigação do 'GeoCognition AI'. Usando a pesquisa na web, encontre a localização mais provável que corresponda a estas características visuais:

{features}

Responda com UM único nome de lugar específico e reconhecível (por exemplo, "Bárcena Mayor, Cantábria, Espanha") e nada mais. Responda em português."#,
    synthesis: r#"Aja como 'GeoCognition AI', um sistema de inteligência geoespacial. Sua missão é gerar um relatório final analisando uma imagem.
**Sua tarefa:**
1. **Conclusão final:** Determine a localização mais provável. Forneça o nome de lugar mais específico e reconhecível possível (por exemplo, "Bárcena Mayor, Cantábria") em vez de descrições genéricas.
2. **Análise forense (IA/alteração):** Inspecione a imagem em busca de artefatos de geração por IA ou manipulação digital e avalie sua autenticidade. Se a imagem não estiver alterada, alterationConfidence deve ser 0.
3. **Análise do ambiente (interior/exterior):** Determine se a cena é interna ou externa e explique as implicações para a geolocalização.
4. **Pontuação de confiança (0-100):** Um marco famoso em alta resolução: 90-95. Um local específico mas pouco conhecido (uma esquina específica): 75-85. Uma paisagem genérica (floresta, praia) com poucas características únicas: 40-60. Se não conseguir determinar uma localização, abaixo de 20.
Gere o relatório no formato JSON solicitado. Se os dados forem inconclusivos, declare isso claramente. Responda em português."#,
    hypothesis_context: r#"Uma investigação preliminar sugeriu esta localização: "{hypothesis}". Trate-a como uma pista a verificar com a evidência visual, não como uma certeza."#,
    trusted_preamble: r#"IMPORTANTE: Esta foto foi tirada nas coordenadas verificadas {coordinates}{label}. Trate esta posição como verdade absoluta. Não infira a localização por conta própria; descreva e nomeie o local nestas coordenadas e use a imagem para confirmar detalhes."#,
    trusted_label: r#" ("{label}")"#,
    no_features: "(nenhuma característica foi extraída)",
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_language_has_non_empty_prompts() {
        for lang in Language::ALL {
            let p = compose_prompts(lang, Some("red roofs"), Some("Porto"), None);
            assert!(!p.feature_extraction.trim().is_empty(), "{lang}");
            assert!(!p.hypothesis.trim().is_empty(), "{lang}");
            assert!(!p.synthesis.trim().is_empty(), "{lang}");
        }
    }

    #[test]
    fn languages_produce_distinct_text() {
        let en = compose_prompts(Language::En, None, None, None);
        for lang in Language::ALL.into_iter().skip(1) {
            let other = compose_prompts(lang, None, None, None);
            assert_ne!(en.synthesis, other.synthesis, "{lang} reuses English text");
        }
    }

    #[test]
    fn unsupported_locale_falls_back_to_english() {
        let en = compose_prompts(Language::En, Some("x"), Some("y"), None);
        let de = compose_prompts_for_locale("de-DE", Some("x"), Some("y"), None);
        let empty = compose_prompts_for_locale("", Some("x"), Some("y"), None);
        assert_eq!(de, en);
        assert_eq!(empty, en);
    }

    #[test]
    fn placeholders_are_filled() {
        for lang in Language::ALL {
            let loc = TrustedLocation::new(43.1, -4.2).unwrap().with_label("Somewhere");
            let trusted = compose_prompts(lang, Some("granite walls"), None, Some(&loc));
            let open = compose_prompts(lang, None, Some("Cabuérniga"), None);
            for text in [
                &trusted.feature_extraction,
                &trusted.hypothesis,
                &trusted.synthesis,
                &open.synthesis,
            ] {
                assert!(!text.contains('{'), "{lang}: unfilled placeholder in {text}");
            }
            assert!(trusted.hypothesis.contains("granite walls"));
            assert!(trusted.synthesis.contains("43.100000, -4.200000"));
            assert!(trusted.synthesis.contains("Somewhere"));
            assert!(open.synthesis.contains("Cabuérniga"));
        }
    }

    #[test]
    fn trusted_location_drops_the_hypothesis_context() {
        let loc = TrustedLocation::new(43.1467, -4.2322).unwrap();
        for lang in Language::ALL {
            let set = prompt_set(lang);
            let lead = set.hypothesis_context.split("{hypothesis}").next().unwrap();
            let with = compose_prompts(lang, None, Some("43.146700, -4.232200"), Some(&loc));
            let without = compose_prompts(lang, None, None, Some(&loc));
            assert_eq!(with.synthesis, without.synthesis, "{lang}");
            assert!(!with.synthesis.contains(lead), "{lang}: {}", with.synthesis);
        }
    }

    #[test]
    fn trusted_preamble_comes_first() {
        let loc = TrustedLocation::new(40.4168, -3.7038).unwrap();
        let with = compose_prompts(Language::En, None, None, Some(&loc));
        let without = compose_prompts(Language::En, None, None, None);
        assert!(with.synthesis.starts_with("IMPORTANT"));
        assert!(with.synthesis.ends_with(&without.synthesis));
        assert!(!without.synthesis.contains("ground truth"));
    }

    #[test]
    fn missing_features_use_placeholder_text() {
        let p = compose_prompts(Language::Es, None, None, None);
        assert!(p.hypothesis.contains("no se extrajeron rasgos"));
        let blank = compose_prompts(Language::Es, Some("   "), None, None);
        assert_eq!(p.hypothesis, blank.hypothesis);
    }

    #[test]
    fn blank_hypothesis_adds_no_context() {
        let a = compose_prompts(Language::Fr, None, Some("  "), None);
        let b = compose_prompts(Language::Fr, None, None, None);
        assert_eq!(a.synthesis, b.synthesis);
    }
}
