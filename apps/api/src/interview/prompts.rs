// LLM prompt constants for the interview service.
// Templates use `{placeholder}` markers replaced before sending.

/// System prompt for the job/resume match analysis.
pub const MATCH_ANALYSIS_SYSTEM: &str = "You are an expert HR analyst. \
    Analyze the match between the job description and resume.";

/// User prompt for the match analysis. Replace `{job_description}` and `{resume}`.
pub const MATCH_ANALYSIS_PROMPT_TEMPLATE: &str = "Job Description:\n{job_description}\n\n\
    Resume:\n{resume}\n\n\
    Provide a detailed analysis of the match.";

/// Marker the interviewer model emits when it has gathered enough information.
pub const COMPLETION_MARKER: &str = "INTERVIEW_COMPLETE";

/// System prompt for each dialogue turn.
pub const INTERVIEWER_SYSTEM: &str = "You are conducting a job interview. \
    Analyze the candidate's response and determine the next question. \
    Reply with the next question only, phrased to be spoken aloud. \
    When you have enough information to evaluate the candidate, reply with \
    INTERVIEW_COMPLETE instead of a question.";

/// Extra system context when the call was placed through `/initiate-interview`.
/// Replace `{job_description}`, `{resume}` and `{analysis}`.
pub const INTERVIEW_CONTEXT_TEMPLATE: &str = "The candidate is interviewing for the following position:\n\
    {job_description}\n\n\
    Candidate resume:\n{resume}\n\n\
    Prior match analysis:\n{analysis}";

/// User prompt for a dialogue turn. Replace `{transcript}`.
pub const CANDIDATE_RESPONSE_TEMPLATE: &str = "Candidate's response: {transcript}";
